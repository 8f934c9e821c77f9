//! Markdown rendering of operation results.
//!
//! Pure text formatting: deals, activities, reports, and statuses rendered
//! for chat-style consumers, with platform deep links. Section text arrives
//! as HTML fragments with citation markers and is flattened to plain text.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use claira_types::operation::{DealOperation, Operation};

const PLATFORM_BASE_URL: &str = "https://platform.claira.io";

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="citation-ref"[^>]*>\[?\d+\]?</span>"#).expect("static regex")
});
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex"));
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>\s*<p>").expect("static regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(\d+);").expect("static regex"));
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

fn deal_url(deal_id: &str, dashboard_id: Option<&str>) -> String {
    let dashboard = dashboard_id.unwrap_or("documents");
    format!("{PLATFORM_BASE_URL}/deal_analysis_ca/{deal_id}?dashboard_id={dashboard}")
}

fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.filter(|v| !v.is_empty()) else {
        return "N/A".to_string();
    };
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.format("%b %-d, %Y").to_string())
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(text) if text.is_empty() => "N/A".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => "(empty)".to_string(),
        Value::Array(items) => {
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        }
        Value::Object(_) => value.to_string(),
    }
}

/// Convert `snake_case` or `camelCase` keys to Title Case.
fn format_field_name(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut previous_lower = false;
    for ch in key.chars() {
        if ch == '_' {
            spaced.push(' ');
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower {
            spaced.push(' ');
        }
        previous_lower = ch.is_lowercase();
        spaced.push(ch);
    }

    spaced
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_object_fields(object: &Map<String, Value>, indent: &str) -> String {
    object
        .iter()
        .map(|(key, value)| {
            format!("{indent}- **{}:** {}", format_field_name(key), format_value(value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten an HTML fragment to plain text: citation markers removed, breaks
/// and paragraphs turned into newlines, tags stripped, entities decoded.
fn strip_html(html: &str) -> String {
    let text = CITATION_RE.replace_all(html, "");
    let text = BR_RE.replace_all(&text, "\n");
    let text = PARAGRAPH_RE.replace_all(&text, "\n\n");
    let text = TAG_RE.replace_all(&text, "");

    let text = text
        .replace("&ldquo;", "\u{201C}")
        .replace("&rdquo;", "\u{201D}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rsquo;", "\u{2019}")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ");

    let text = NUMERIC_ENTITY_RE.replace_all(&text, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    BLANK_RUN_RE.replace_all(&text, "\n\n").trim().to_string()
}

/// Whether an object looks like a section content field
/// (`{type, value: {text: "<html>"}, ...}`).
fn is_section_content_field(value: &Value) -> bool {
    let Some(object) = value.as_object() else { return false };
    object.get("type").is_some()
        && object
            .get("value")
            .and_then(Value::as_object)
            .and_then(|v| v.get("text"))
            .is_some()
}

/// Clean text of a section content field, HTML stripped.
fn format_section_field(field: &Value) -> String {
    let text = field
        .get("value")
        .and_then(|value| value.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let cleaned = strip_html(text);
    if cleaned.is_empty() {
        "N/A".to_string()
    } else {
        cleaned
    }
}

fn format_section_contents(section_contents: &Map<String, Value>) -> String {
    let mut md = String::new();
    for (section_key, section_value) in section_contents {
        md.push_str(&format!("\n\n#### {}", format_field_name(section_key)));

        match section_value.as_object() {
            Some(fields) => {
                let lines: Vec<String> = fields
                    .iter()
                    .map(|(field_key, field_value)| {
                        if is_section_content_field(field_value) {
                            format!("- **{field_key}:** {}", format_section_field(field_value))
                        } else {
                            format!(
                                "- **{}:** {}",
                                format_field_name(field_key),
                                format_value(field_value)
                            )
                        }
                    })
                    .collect();
                if !lines.is_empty() {
                    md.push('\n');
                    md.push_str(&lines.join("\n"));
                }
            }
            None => {
                md.push_str(&format!("\n- {}", format_value(section_value)));
            }
        }
    }
    md
}

fn str_field<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn object_field<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

pub fn format_deal(deal: &Value) -> String {
    let deal_id = str_field(deal, "id").unwrap_or_default();
    let asset_name = str_field(deal, "asset_name").unwrap_or("Unnamed Deal");

    let mut md = format!(
        "## {asset_name}\n- **ID:** {deal_id}\n- **Created:** {}\n- **Updated:** {}\n- **Link:** [Open Deal]({})",
        format_date(str_field(deal, "created_at")),
        format_date(str_field(deal, "updated_at")),
        deal_url(deal_id, None),
    );

    if let Some(data) = object_field(deal, "data").filter(|d| !d.is_empty()) {
        md.push_str("\n\n### Deal Data\n");
        md.push_str(&format_object_fields(data, ""));
    }
    if let Some(sections) = object_field(deal, "section_contents").filter(|s| !s.is_empty()) {
        md.push_str("\n\n### Section Contents");
        md.push_str(&format_section_contents(sections));
    }
    md
}

pub fn format_deals(deals: &[Value]) -> String {
    if deals.is_empty() {
        return "# Deals\n\nNo deals found.".to_string();
    }
    let sections = deals.iter().map(format_deal).collect::<Vec<_>>().join("\n\n---\n\n");
    format!("# Deals ({} total)\n\n{sections}", deals.len())
}

pub fn format_deal_status(data: &Value) -> String {
    let deal_id = str_field(data, "deal_id").unwrap_or_default();
    let status = str_field(data, "status").filter(|s| !s.is_empty()).unwrap_or("No status");
    format!(
        "## Deal Status\n- **Deal ID:** {deal_id}\n- **Status:** {status}\n- **Link:** [Open Deal]({})",
        deal_url(deal_id, None),
    )
}

pub fn format_status_options(data: &Value) -> String {
    let options: Vec<&str> = data
        .get("status_options")
        .and_then(Value::as_array)
        .map(|opts| opts.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut md = String::from("# Status Options\n\n");
    if options.is_empty() {
        md.push_str("No status options available.\n");
    } else {
        md.push_str(&options.iter().map(|opt| format!("- {opt}")).collect::<Vec<_>>().join("\n"));
    }

    if let Some(rules) = object_field(data, "deal_report_rules").filter(|r| !r.is_empty()) {
        md.push_str("\n\n## Report Rules by Status\n");
        for (status, rule) in rules {
            let templates: Vec<&str> = rule
                .get("createReportsFromTemplates")
                .and_then(Value::as_array)
                .map(|t| t.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            if !templates.is_empty() {
                md.push_str(&format!(
                    "\n**{status}:** Creates reports from {}",
                    templates.join(", ")
                ));
            }
        }
    }
    md
}

pub fn format_activity(activity: &Value) -> String {
    let title = str_field(activity, "title").filter(|t| !t.is_empty()).unwrap_or("Untitled");
    let user_name = activity
        .get("user")
        .and_then(Value::as_object)
        .map(|user| {
            let full = format!(
                "{} {}",
                user.get("first_name").and_then(Value::as_str).unwrap_or_default(),
                user.get("last_name").and_then(Value::as_str).unwrap_or_default(),
            );
            let full = full.trim().to_string();
            if full.is_empty() {
                user.get("email").and_then(Value::as_str).unwrap_or("Unknown").to_string()
            } else {
                full
            }
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let mut md = format!(
        "### {title}\n- **Date:** {}\n- **By:** {user_name}",
        format_date(str_field(activity, "created_at")),
    );

    if let Some(deal_id) = str_field(activity, "deal_id").filter(|id| !id.is_empty()) {
        md.push_str(&format!("\n- **Deal:** [View]({})", deal_url(deal_id, None)));
    }
    if let Some(description) = str_field(activity, "description").filter(|d| !d.is_empty()) {
        md.push_str(&format!("\n\n{description}"));
    }
    md
}

pub fn format_activities(activities: &[Value]) -> String {
    if activities.is_empty() {
        return "# Activities\n\nNo activities found.".to_string();
    }
    let sections = activities.iter().map(format_activity).collect::<Vec<_>>().join("\n\n---\n\n");
    format!("# Activities ({})\n\n{sections}", activities.len())
}

pub fn format_report(report: &Value, deal_id: Option<&str>) -> String {
    let title = str_field(report, "title").filter(|t| !t.is_empty()).unwrap_or("Untitled Report");
    let report_id = str_field(report, "id").unwrap_or_default();
    let yes_no = |key: &str| {
        if report.get(key).and_then(Value::as_bool).unwrap_or(false) {
            "Yes"
        } else {
            "No"
        }
    };

    let mut md = format!(
        "## {title}\n- **ID:** {report_id}\n- **Public:** {}\n- **Default:** {}\n- **Created:** {}",
        yes_no("public"),
        yes_no("is_default"),
        format_date(str_field(report, "created_at")),
    );

    if let Some(deal) = deal_id.or_else(|| str_field(report, "deal_id")) {
        md.push_str(&format!("\n- **Link:** [Open Report]({})", deal_url(deal, Some(report_id))));
    }

    if let Some(sections) = report.get("sections").and_then(Value::as_array).filter(|s| !s.is_empty())
    {
        md.push_str(&format!("\n\n### Sections ({})", sections.len()));
        for section in sections {
            let section_title =
                str_field(section, "title").filter(|t| !t.is_empty()).unwrap_or("Untitled Section");
            let section_type = str_field(section, "section_type").unwrap_or("unknown");
            md.push_str(&format!("\n\n#### {section_title} ({section_type})"));
            if let Some(value) = section.get("value") {
                let text = extract_text(value);
                if !text.is_empty() {
                    md.push_str(&format!("\n\n{text}"));
                }
            }
        }
    }
    md
}

pub fn format_reports(reports: &[Value], deal_id: Option<&str>) -> String {
    if reports.is_empty() {
        return "# Reports\n\nNo reports found.".to_string();
    }
    let sections = reports
        .iter()
        .map(|report| format_report(report, deal_id))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("# Reports ({})\n\n{sections}", reports.len())
}

pub fn format_report_section(section: &Value) -> String {
    let title = str_field(section, "title").filter(|t| !t.is_empty()).unwrap_or("Untitled Section");
    let section_type = str_field(section, "section_type").unwrap_or("unknown");
    let position = section.get("position").and_then(Value::as_i64).unwrap_or_default();

    let mut md =
        format!("## {title}\n- **Type:** {section_type}\n- **Position:** {position}");

    match section.get("value") {
        Some(value) => {
            let text = extract_text(value);
            if !text.is_empty() {
                md.push_str(&format!("\n\n### Content\n\n{text}"));
            } else if let Some(fields) = value.as_object().filter(|f| !f.is_empty()) {
                md.push_str("\n\n### Content\n");
                md.push_str(&format_object_fields(fields, ""));
            }
        }
        None => {}
    }
    md
}

pub fn format_report_sections(sections: &[Value]) -> String {
    if sections.is_empty() {
        return "# Report Sections\n\nNo sections found.".to_string();
    }
    let blocks =
        sections.iter().map(format_report_section).collect::<Vec<_>>().join("\n\n---\n\n");
    format!("# Report Sections ({})\n\n{blocks}", sections.len())
}

pub fn format_created_deal(deal: &Value) -> String {
    let deal_id = str_field(deal, "id").unwrap_or_default();
    let asset_name = str_field(deal, "asset_name").unwrap_or("Unnamed Deal");
    let asset_id = str_field(deal, "asset_id").unwrap_or_default();

    let mut md = format!(
        "# Deal Created\n\n## {asset_name}\n- **Deal ID:** {deal_id}\n- **Asset ID:** {asset_id}\n- **Link:** [Open Deal]({})",
        deal_url(deal_id, None),
    );

    if let Some(data) = object_field(deal, "data").filter(|d| !d.is_empty()) {
        md.push_str("\n\n### Deal Data\n");
        md.push_str(&format_object_fields(data, ""));
    }
    if let Some(sections) = object_field(deal, "section_contents").filter(|s| !s.is_empty()) {
        md.push_str("\n\n### Section Contents");
        md.push_str(&format_section_contents(sections));
    }
    md
}

pub fn format_set_status(data: &Value) -> String {
    // The update response nests the deal one or two `data` levels deep
    // depending on the endpoint version.
    let response = data.get("data").filter(|v| v.is_object()).unwrap_or(data);
    let deal = response.get("data").filter(|v| v.is_object()).unwrap_or(response);
    let deal_id = str_field(deal, "id").or_else(|| str_field(data, "deal_id")).unwrap_or_default();
    let status = deal
        .get("data")
        .and_then(|d| d.get("status"))
        .and_then(Value::as_str)
        .or_else(|| str_field(deal, "status"))
        .unwrap_or("Updated");

    let mut md = format!(
        "# Status Updated\n\n- **Deal ID:** {deal_id}\n- **New Status:** {status}\n- **Link:** [Open Deal]({})",
        deal_url(deal_id, None),
    );

    if let Some(reports) = data.get("created_reports").and_then(Value::as_array).filter(|r| !r.is_empty())
    {
        md.push_str(&format!("\n\n## Reports Created ({})", reports.len()));
        for report in reports {
            let name = str_field(report, "template_name")
                .or_else(|| str_field(report, "title"))
                .unwrap_or("Report");
            let dashboard_id = str_field(report, "dashboard_id");
            md.push_str(&format!(
                "\n- **{name}** ([Open Report]({}))",
                deal_url(deal_id, dashboard_id)
            ));
        }
    }
    md
}

pub fn format_created_activity(activity: &Value) -> String {
    let title = str_field(activity, "title").filter(|t| !t.is_empty()).unwrap_or("Untitled");
    let activity_id = str_field(activity, "id").unwrap_or_default();

    let mut md = format!("# Activity Created\n\n## {title}\n- **Activity ID:** {activity_id}");
    if let Some(deal_id) = str_field(activity, "deal_id").filter(|id| !id.is_empty()) {
        md.push_str(&format!("\n- **Deal:** [View Deal]({})", deal_url(deal_id, None)));
    }
    if let Some(description) = str_field(activity, "description").filter(|d| !d.is_empty()) {
        md.push_str(&format!("\n\n{description}"));
    }
    md
}

/// Best-effort extraction of readable text from a section value.
///
/// Section values vary wildly: plain strings, `{text}`, `{html}`, nested
/// `{value}`/`{data}` wrappers, item lists. The last resort picks the first
/// long string field that does not look like an identifier.
fn extract_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(object) => {
            for key in ["text", "content", "markdown"] {
                if let Some(text) = object.get(key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            if let Some(html) = object.get("html").and_then(Value::as_str) {
                return strip_html(html);
            }
            for key in ["body", "summary", "analysis", "response", "output"] {
                if let Some(text) = object.get(key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            for key in ["value", "data"] {
                if let Some(nested) = object.get(key) {
                    let text = extract_text(nested);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
            if let Some(items) = object.get("items").and_then(Value::as_array) {
                let texts: Vec<String> =
                    items.iter().map(extract_text).filter(|t| !t.is_empty()).collect();
                if !texts.is_empty() {
                    return texts.join("\n\n");
                }
            }
            object
                .iter()
                .find(|(key, val)| {
                    val.as_str().is_some_and(|s| s.len() > 50)
                        && !key.contains("id")
                        && !key.contains("url")
                })
                .and_then(|(_, val)| val.as_str())
                .unwrap_or_default()
                .to_string()
        }
        _ => String::new(),
    }
}

/// Render the results of one operation as markdown, when a rendering exists
/// for it. Operations without one (raw data fetches, uploads) return `None`
/// and are presented as JSON by the caller.
pub fn render_operation(operation: &Operation, items: &[Value]) -> Option<String> {
    let Operation::Deals(op) = operation else { return None };
    let first = items.first();
    Some(match op {
        DealOperation::GetAll(_) => format_deals(items),
        DealOperation::Get { .. } => format_deal(first?),
        DealOperation::Create(_) => format_created_deal(first?),
        DealOperation::GetStatus { .. } => format_deal_status(first?),
        DealOperation::SetStatus(_) => format_set_status(first?),
        DealOperation::GetStatusOptions { .. } => format_status_options(first?),
        DealOperation::GetActivities(_) => format_activities(items),
        DealOperation::CreateActivity(_) => format_created_activity(first?),
        DealOperation::GetReports { .. } => format_reports(items, None),
        DealOperation::GetReportSections { .. } => format_report_sections(items),
        DealOperation::AskQuestion(_) => return None,
    })
}
