use maud::{DOCTYPE, Markup, PreEscaped, html};

/// How long a notification stays visible, in milliseconds
const NOTICE_TIMEOUT_MS: u32 = 6000;

/// Renders the single page client
pub fn page(title: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body data-notice-timeout=(NOTICE_TIMEOUT_MS) {
                main {
                    h1 { (title) }

                    section.panel {
                        h2 { "Available Configurations" }
                        ul #configs {}
                        p #empty hidden { "No configurations yet." }
                    }

                    section.panel {
                        h2 { "Create New Configuration" }
                        form #create-form {
                            label for="config-name" { "Configuration Name" }
                            input #config-name type="text" autocomplete="off" spellcheck="false";
                            label for="config-content" { "Configuration Content" }
                            textarea #config-content rows="8" spellcheck="false" {}
                            button type="submit" { "Create Configuration" }
                        }
                    }
                }

                div #notice.notice role="status" hidden {
                    span #notice-text {}
                    button #notice-close type="button" aria-label="Close" { "×" }
                }

                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f4f5f7; margin: 0; color: #1f2328; }
main { max-width: 48rem; margin: 1.25rem auto; padding: 0 1rem; }
h1 { text-align: center; font-weight: 400; }
.panel { background: #fff; border-radius: 4px; box-shadow: 0 1px 4px rgba(0,0,0,.2); padding: 1.25rem; margin-bottom: 1.25rem; }
#configs { list-style: none; padding: 0; margin: 0; }
#configs li { display: flex; align-items: center; gap: .5rem; padding: .6rem 0; border-bottom: 1px solid #e1e4e8; }
#configs li span { flex: 1; font-family: ui-monospace, monospace; }
form { display: grid; gap: .5rem; }
input, textarea { font: inherit; padding: .5rem; border: 1px solid #c9ced6; border-radius: 4px; }
textarea { font-family: ui-monospace, monospace; }
button { font: inherit; cursor: pointer; padding: .4rem .9rem; border: 0; border-radius: 4px; background: #1976d2; color: #fff; }
button.secondary { background: #e8eaed; color: #1f2328; }
.notice { position: fixed; left: 1.5rem; bottom: 1.5rem; display: flex; gap: 1rem; align-items: center; padding: .75rem 1rem; border-radius: 4px; color: #fff; }
.notice button { background: transparent; padding: 0 .25rem; }
.notice.success { background: #2e7d32; }
.notice.warning { background: #ed6c02; }
.notice.error { background: #d32f2f; }
"#;

const SCRIPT: &str = r#"
(() => {
  const $ = (id) => document.getElementById(id);
  const timeout = Number(document.body.dataset.noticeTimeout);
  let configs = [];
  let noticeTimer = null;

  function notify(message, severity) {
    $("notice-text").textContent = message;
    $("notice").className = "notice " + severity;
    $("notice").hidden = false;
    clearTimeout(noticeTimer);
    noticeTimer = setTimeout(closeNotice, timeout);
  }

  function closeNotice() {
    clearTimeout(noticeTimer);
    $("notice").hidden = true;
  }

  async function failure(res, fallback) {
    try {
      const body = await res.json();
      return new Error(body.message || fallback);
    } catch (_) {
      return new Error(fallback);
    }
  }

  function render() {
    const list = $("configs");
    list.replaceChildren();
    for (const name of configs) {
      const item = document.createElement("li");
      const label = document.createElement("span");
      label.textContent = name;
      const download = document.createElement("button");
      download.type = "button";
      download.className = "secondary";
      download.textContent = "Download";
      download.addEventListener("click", () => downloadConfig(name));
      const remove = document.createElement("button");
      remove.type = "button";
      remove.className = "secondary";
      remove.textContent = "Delete";
      remove.addEventListener("click", () => deleteConfig(name));
      item.append(label, download, remove);
      list.append(item);
    }
    $("empty").hidden = configs.length > 0;
  }

  async function fetchConfigs() {
    try {
      const res = await fetch("/list-configs");
      if (!res.ok) throw await failure(res, "Error fetching configurations");
      configs = (await res.json()).configs;
      render();
    } catch (err) {
      notify(err.message || "Error fetching configurations", "error");
    }
  }

  async function downloadConfig(name) {
    try {
      const res = await fetch("/download-config/" + encodeURIComponent(name));
      if (!res.ok) throw await failure(res, "Error downloading configuration");
      const url = URL.createObjectURL(await res.blob());
      const link = document.createElement("a");
      link.href = url;
      link.download = name;
      document.body.append(link);
      link.click();
      link.remove();
      URL.revokeObjectURL(url);
      notify("Configuration downloaded", "success");
    } catch (err) {
      notify(err.message || "Error downloading configuration", "error");
    }
  }

  async function createConfig(event) {
    event.preventDefault();
    const name = $("config-name").value;
    const content = $("config-content").value;
    if (!name || !content) {
      notify("Name and content are required", "warning");
      return;
    }
    try {
      const res = await fetch("/create-config", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ name, content }),
      });
      if (!res.ok) throw await failure(res, "Error creating configuration");
      $("config-name").value = "";
      $("config-content").value = "";
      fetchConfigs();
      notify("Configuration created successfully", "success");
    } catch (err) {
      notify(err.message || "Error creating configuration", "error");
    }
  }

  async function deleteConfig(name) {
    try {
      const res = await fetch("/delete-config/" + encodeURIComponent(name), { method: "DELETE" });
      if (!res.ok) throw await failure(res, "Error deleting configuration");
      fetchConfigs();
      notify("Configuration deleted", "success");
    } catch (err) {
      notify(err.message || "Error deleting configuration", "error");
    }
  }

  $("create-form").addEventListener("submit", createConfig);
  $("notice-close").addEventListener("click", closeNotice);
  fetchConfigs();
})();
"#;
