use super::types::{LogEntry, ReportNode, ReportRun, Status};
use anyhow::Result;
use std::path::Path;

/// Re-render the HTML report of a saved run
pub async fn generate(run: &ReportRun, output: Option<&Path>) -> Result<()> {
    let html = render(run);

    if let Some(path) = output {
        std::fs::write(path, run.charset.encode(&html))?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

/// Render the run as a self-contained page. The output is still Unicode;
/// the caller encodes it in the run's charset.
pub fn render(run: &ReportRun) -> String {
    let total = run.roots().count();
    let failed = run.failed_count();
    let skipped = run
        .roots()
        .filter(|n| run.status(n.id) == Status::Skip)
        .count();
    let passed = total - failed - skipped;
    let pass_rate = if total > 0 {
        (passed as f64 / total as f64 * 100.0) as u32
    } else {
        0
    };

    let mut nodes_html = String::new();
    for node in run.roots() {
        nodes_html.push_str(&render_node(run, node));
    }

    let mut info_html = String::new();
    for (key, value) in &run.system_info {
        info_html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            html_escape(key),
            html_escape(value)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pt">
<head>
    <meta charset="{charset}">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --bg-tertiary: #1f2937;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
            --blue: #3b82f6;
            --purple: #8b5cf6;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 3rem 1rem;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; }}
        header {{ margin-bottom: 2rem; }}
        h1 {{ font-size: 2rem; font-weight: 800; }}
        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 1.25rem;
            border-radius: 1rem;
        }}
        .stat-value {{ font-size: 2.25rem; font-weight: 800; }}
        .stat-label {{ color: var(--text-secondary); font-size: 0.8rem; text-transform: uppercase; }}
        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}
        .stat.skipped .stat-value {{ color: var(--yellow); }}
        .progress-bar {{
            background: var(--bg-secondary);
            height: 10px;
            border-radius: 5px;
            overflow: hidden;
            margin-bottom: 2rem;
            border: 1px solid var(--border);
        }}
        .progress-fill {{ height: 100%; background: var(--green); }}
        table.info {{ border-collapse: collapse; margin-bottom: 2rem; }}
        table.info th, table.info td {{ padding: 0.25rem 1rem 0.25rem 0; text-align: left; }}
        table.info th {{ color: var(--text-secondary); font-weight: 500; }}
        .node {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1rem;
            margin-bottom: 1.5rem;
            overflow: hidden;
        }}
        .node .node {{ margin: 0.5rem 1.5rem 1rem 3rem; border-radius: 0.75rem; }}
        .node-header {{
            padding: 1rem 1.5rem;
            display: flex;
            justify-content: space-between;
            align-items: center;
            border-bottom: 1px solid var(--border);
        }}
        .node-header h3 {{ font-size: 1.1rem; display: flex; gap: 0.75rem; align-items: center; }}
        .badge {{ padding: 0.15rem 0.7rem; border-radius: 9999px; font-size: 0.7rem; text-transform: uppercase; }}
        .node.pass > .node-header .badge {{ background: rgba(16, 185, 129, 0.1); color: var(--green); }}
        .node.fail > .node-header .badge, .node.error > .node-header .badge {{ background: rgba(239, 68, 68, 0.1); color: var(--red); }}
        .node.skip > .node-header .badge {{ background: rgba(245, 158, 11, 0.1); color: var(--yellow); }}
        .description {{ color: var(--text-secondary); font-size: 0.85rem; padding: 0.5rem 1.5rem 0; }}
        .categories {{ padding: 0.5rem 1.5rem 0; display: flex; gap: 0.5rem; flex-wrap: wrap; }}
        .category {{ background: rgba(139, 92, 246, 0.12); color: var(--purple); border-radius: 0.4rem; padding: 0.1rem 0.5rem; font-size: 0.75rem; }}
        .entries {{ padding: 1rem 1.5rem; }}
        .entry {{ display: flex; gap: 1rem; padding: 0.6rem; border-radius: 0.6rem; }}
        .entry:hover {{ background: var(--bg-tertiary); }}
        .entry-icon {{ width: 1.75rem; text-align: center; font-size: 1.1rem; flex-shrink: 0; }}
        .entry.pass .entry-icon {{ color: var(--green); }}
        .entry.fail .entry-icon, .entry.error .entry-icon {{ color: var(--red); }}
        .entry.skip .entry-icon {{ color: var(--yellow); }}
        .entry.info .entry-icon {{ color: var(--blue); }}
        .entry-content {{ flex: 1; }}
        .timestamp {{ color: var(--text-secondary); font-size: 0.7rem; }}
        .details {{
            background: rgba(239, 68, 68, 0.1);
            border: 1px solid rgba(239, 68, 68, 0.2);
            border-radius: 0.5rem;
            padding: 0.6rem;
            margin-top: 0.5rem;
            color: #fca5a5;
            font-family: monospace;
            font-size: 0.8rem;
            white-space: pre-wrap;
        }}
        .thumb {{ margin-top: 0.5rem; max-width: 240px; border-radius: 0.4rem; border: 1px solid var(--border); cursor: pointer; }}
        .duration {{ color: var(--text-secondary); font-size: 0.75rem; }}
        .meta {{
            margin-top: 3rem;
            padding-top: 1.5rem;
            border-top: 1px solid var(--border);
            color: var(--text-secondary);
            font-size: 0.85rem;
            display: flex;
            justify-content: center;
            gap: 2rem;
        }}
        #modal {{
            display: none;
            position: fixed;
            z-index: 100;
            inset: 0;
            background: rgba(0, 0, 0, 0.9);
            padding: 2rem;
            align-items: center;
            justify-content: center;
        }}
        #modal img {{ max-width: 100%; max-height: 100%; }}
        #modal.active {{ display: flex; }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>{title}</h1>
        </header>

        <div class="summary">
            <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Scenarios</div></div>
            <div class="stat passed"><div class="stat-value">{passed}</div><div class="stat-label">Passed</div></div>
            <div class="stat failed"><div class="stat-value">{failed}</div><div class="stat-label">Failed</div></div>
            <div class="stat skipped"><div class="stat-value">{skipped}</div><div class="stat-label">Skipped</div></div>
        </div>

        <div class="progress-bar"><div class="progress-fill" style="width: {pass_rate}%"></div></div>

        <table class="info">{info_html}</table>

        {nodes_html}

        <div class="meta">
            <span>Session: {session}</span>
            <span>Started: {started}</span>
            <span>Generated: {generated}</span>
        </div>
    </div>

    <div id="modal" onclick="this.classList.remove('active')">
        <img id="modal-img" src="" alt="Screenshot">
    </div>

    <script>
        function showScreenshot(path) {{
            document.getElementById('modal-img').src = path;
            document.getElementById('modal').classList.add('active');
        }}
    </script>
</body>
</html>"#,
        charset = run.charset.as_str(),
        title = html_escape(&run.run_name),
        session = html_escape(&run.session_id),
        started = html_escape(&run.started_at),
        generated = html_escape(&run.generated_at),
    )
}

fn render_node(run: &ReportRun, node: &ReportNode) -> String {
    let status = run.status(node.id);

    let categories_html: String = node
        .categories
        .iter()
        .map(|c| format!(r#"<span class="category">{}</span>"#, html_escape(c)))
        .collect();

    let entries_html: String = node.entries.iter().map(render_entry).collect();
    let children_html: String = run.children(node).map(|c| render_node(run, c)).collect();

    let duration_html = node
        .duration_ms
        .map(|d| format!(r#"<span class="duration">{}</span>"#, format_duration(d)))
        .unwrap_or_default();

    let description_html = if node.description.is_empty() || node.description == node.name {
        String::new()
    } else {
        format!(
            r#"<div class="description">{}</div>"#,
            html_escape(&node.description)
        )
    };

    format!(
        r#"
        <div class="node {status}">
            <div class="node-header">
                <h3>{name} <span class="badge">{status}</span></h3>
                {duration_html}
            </div>
            {description_html}
            <div class="categories">{categories_html}</div>
            <div class="entries">{entries_html}</div>
            {children_html}
        </div>"#,
        status = status.as_str(),
        name = html_escape(&node.name),
    )
}

fn render_entry(entry: &LogEntry) -> String {
    let icon = match entry.status {
        Status::Pass => "✓",
        Status::Fail => "✗",
        Status::Info => "ℹ",
        Status::Skip => "○",
        Status::Error => "⚠",
    };

    let details_html = entry
        .details
        .as_deref()
        .map(|d| format!(r#"<div class="details">{}</div>"#, html_escape(d)))
        .unwrap_or_default();

    let media_html = entry
        .media
        .as_deref()
        .map(|m| {
            let src = html_escape(m);
            format!(
                r#"<img class="thumb" src="{src}" alt="screenshot" onclick="showScreenshot('{src}')">"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"
                <div class="entry {class}">
                    <div class="entry-icon">{icon}</div>
                    <div class="entry-content">
                        <div>{message}</div>
                        <div class="timestamp">{timestamp}</div>
                        {details_html}
                        {media_html}
                    </div>
                </div>"#,
        class = entry.status.as_str(),
        message = html_escape(&entry.message),
        timestamp = html_escape(&entry.timestamp),
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) as f64 / 1000.0;
        format!("{}m {:.0}s", minutes, seconds)
    }
}
