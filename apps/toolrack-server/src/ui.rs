//! Static HTML shell for the widget timeline UI. The page fetches the
//! timeline as JSON and renders cards client-side; server-rendered fragments
//! from `/render` use the same class names and action helpers.

const SHELL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Toolrack Activity Timeline</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            padding: 20px;
        }
        .container { max-width: 1200px; margin: 0 auto; }
        .header {
            background: white;
            border-radius: 12px;
            padding: 24px;
            margin-bottom: 24px;
            box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
        }
        .header h1 { color: #333; margin-bottom: 8px; }
        .header p { color: #666; }
        .timeline { display: grid; gap: 20px; }
        .widget-card {
            background: white;
            border-radius: 12px;
            padding: 20px;
            box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
            border-left: 4px solid #667eea;
        }
        .widget-card.success { border-left-color: #10b981; }
        .widget-card.warning { border-left-color: #f59e0b; }
        .widget-card.error { border-left-color: #ef4444; }
        .widget-card.info { border-left-color: #3b82f6; }
        .widget-header { display: flex; justify-content: space-between; margin-bottom: 12px; }
        .widget-title { font-size: 18px; font-weight: 600; color: #333; margin-bottom: 4px; }
        .widget-meta { font-size: 12px; color: #999; }
        .widget-content { color: #555; line-height: 1.6; margin-bottom: 16px; }
        .widget-actions { display: flex; gap: 8px; flex-wrap: wrap; }
        .action-btn {
            padding: 8px 16px;
            border: none;
            border-radius: 6px;
            cursor: pointer;
            font-size: 14px;
            font-weight: 500;
            background: #667eea;
            color: white;
        }
        .action-btn:hover { background: #5568d3; }
        .action-btn.secondary { background: #e5e7eb; color: #333; }
        .action-btn.secondary:hover { background: #d1d5db; }
        .loading { text-align: center; padding: 40px; color: white; font-size: 18px; }
        .empty { text-align: center; padding: 40px; background: white; border-radius: 12px; color: #666; }
        .refresh-btn {
            position: fixed;
            bottom: 24px;
            right: 24px;
            width: 56px;
            height: 56px;
            border-radius: 50%;
            background: white;
            border: none;
            box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
            cursor: pointer;
            font-size: 24px;
        }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Activity Timeline</h1>
            <p>Interactive widgets from your tool services</p>
        </div>
        <div id="timeline" class="timeline">
            <div class="loading">Loading widgets...</div>
        </div>
    </div>
    <button class="refresh-btn" onclick="loadWidgets()" title="Refresh">&#8635;</button>
    <script>
        const basePath = '__BASE_PATH__';

        async function loadWidgets() {
            const timeline = document.getElementById('timeline');
            timeline.innerHTML = '<div class="loading">Loading widgets...</div>';
            try {
                const response = await fetch(`${basePath}/timeline?limit=50`);
                const data = await response.json();
                const widgets = data.widgets || [];
                if (widgets.length === 0) {
                    timeline.innerHTML = '<div class="empty">No widgets available</div>';
                    return;
                }
                timeline.innerHTML = widgets.map(widget => renderWidget(widget)).join('');
            } catch (error) {
                timeline.innerHTML = `<div class="empty">Error loading widgets: ${error.message}</div>`;
            }
        }

        function renderWidget(widget) {
            const timestamp = new Date(widget.timestamp).toLocaleString();
            const actions = widget.actions.map((action, idx) =>
                `<button class="action-btn ${idx > 0 ? 'secondary' : ''}" onclick='handleWidgetAction("${widget.id}", ${idx}, ${JSON.stringify(action)})'>${escapeHtml(action.label)}</button>`
            ).join('');
            return `
                <div class="widget-card ${widget.card_type}">
                    <div class="widget-header">
                        <div>
                            <div class="widget-title">${escapeHtml(widget.title)}</div>
                            <div class="widget-meta">
                                ${widget.service_name ? escapeHtml(widget.service_name) : ''}
                                ${widget.tool_name ? ' &bull; ' + escapeHtml(widget.tool_name) : ''}
                                &bull; ${timestamp}
                            </div>
                        </div>
                    </div>
                    <div class="widget-content">${widget.content}</div>
                    ${actions ? `<div class="widget-actions">${actions}</div>` : ''}
                </div>
            `;
        }

        async function handleWidgetAction(widgetId, actionIndex, action) {
            if (action.confirm) {
                if (!confirm(action.confirm_message || 'Are you sure?')) {
                    return;
                }
            }
            try {
                let url = action.url;
                if (!url.startsWith('http')) {
                    url = basePath.replace('/v1/widgets', '') + url;
                }
                const options = {
                    method: action.method || 'POST',
                    headers: { 'Content-Type': 'application/json' },
                };
                if (action.method !== 'GET' && Object.keys(action.payload || {}).length > 0) {
                    options.body = JSON.stringify(action.payload);
                }
                const response = await fetch(url, options);
                const result = await response.json();
                alert(`Action completed: ${JSON.stringify(result)}`);
                loadWidgets();
            } catch (error) {
                alert(`Error executing action: ${error.message}`);
            }
        }

        function showActionMenu(widgetId) {
            alert('More actions are available on the desktop view.');
        }

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        loadWidgets();
        setInterval(loadWidgets, 30000);
    </script>
</body>
</html>"#;

pub fn render_shell(base_path: &str) -> String {
    SHELL_TEMPLATE.replace("__BASE_PATH__", base_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_embeds_base_path() {
        let html = render_shell("/v1/widgets");
        assert!(html.contains("const basePath = '/v1/widgets';"));
        assert!(!html.contains("__BASE_PATH__"));
    }
}
