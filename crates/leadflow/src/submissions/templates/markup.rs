use std::fmt::Write as _;

/// Markup that is safe to splice into a document. Untrusted text only enters
/// through [`Html::text`], which escapes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    pub fn text(raw: &str) -> Self {
        Self(escape(raw))
    }

    pub(crate) fn trusted(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn push(&mut self, other: Html) {
        self.0.push_str(&other.0);
    }
}

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub(crate) const ACCENT: &str = "#4f46e5";
pub(crate) const MUTED: &str = "#6b7280";
pub(crate) const INK: &str = "#0f172a";

pub fn mailto(email: &str) -> Html {
    let email = escape(email.trim());
    Html(format!(
        "<a href=\"mailto:{email}\" style=\"color:{ACCENT};text-decoration:none;\">{email}</a>"
    ))
}

pub fn tel(phone: &str) -> Html {
    let display = escape(phone.trim());
    let dial: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if dial.is_empty() {
        return Html(display);
    }
    Html(format!(
        "<a href=\"tel:{dial}\" style=\"color:{ACCENT};text-decoration:none;\">{display}</a>"
    ))
}

/// Links only `http(s)` URLs; anything else is shown as inert text.
pub fn external_link(url: &str, label: &str) -> Html {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Html(format!(
            "<a href=\"{}\" style=\"color:{ACCENT};text-decoration:none;\">{}</a>",
            escape(trimmed),
            escape(label)
        ))
    } else {
        Html::text(trimmed)
    }
}

pub fn heading(title: &str, subtitle: &str) -> Html {
    Html(format!(
        "<h1 style=\"margin:0 0 8px 0;color:#111827;font-size:22px;font-weight:700;\">{}</h1>\
         <p style=\"margin:0 0 18px 0;color:{MUTED};font-size:14px;\">{}</p>",
        escape(title),
        escape(subtitle)
    ))
}

/// Heading whose subtitle already contains markup (e.g. a bolded name).
pub fn heading_html(title: &str, subtitle: Html) -> Html {
    Html(format!(
        "<h1 style=\"margin:0 0 8px 0;color:#111827;font-size:22px;font-weight:700;\">{}</h1>\
         <p style=\"margin:0 0 18px 0;color:{MUTED};font-size:14px;\">{}</p>",
        escape(title),
        subtitle.as_str()
    ))
}

pub fn strong(raw: &str) -> Html {
    Html(format!("<strong>{}</strong>", escape(raw)))
}

/// Free text rendered with its line breaks preserved.
pub fn quote_block(label: &str, body: &str) -> Html {
    Html(format!(
        "<div style=\"margin-top:18px;\">\
         <div style=\"font-size:13px;color:{MUTED};margin-bottom:6px;font-weight:600;text-transform:uppercase;\">{}</div>\
         <div style=\"background:#ffffff;border-left:3px solid {ACCENT};padding:12px;border-radius:6px;color:{INK};white-space:pre-wrap;\">{}</div>\
         </div>",
        escape(label),
        escape(body)
    ))
}

pub fn callout(text: &str, background: &str, border: &str, color: &str) -> Html {
    Html(format!(
        "<div style=\"margin-top:18px;padding:12px;background:{background};border-radius:6px;border-left:3px solid {border};\">\
         <div style=\"color:{color};font-size:13px;font-weight:600;\">{}</div></div>",
        escape(text)
    ))
}

pub fn bullet_list(title: &str, items: &[&str]) -> Html {
    let mut markup = format!(
        "<div style=\"background:#eff6ff;padding:14px;border-radius:6px;margin-bottom:16px;\">\
         <div style=\"font-size:13px;color:#1e40af;font-weight:600;margin-bottom:8px;\">{}</div>\
         <ul style=\"margin:0;padding-left:20px;color:#1e40af;font-size:13px;\">",
        escape(title)
    );
    for item in items {
        let _ = write!(markup, "<li>{}</li>", escape(item));
    }
    markup.push_str("</ul></div>");
    Html(markup)
}

pub fn paragraph(text: &str) -> Html {
    Html(format!(
        "<p style=\"margin:0 0 16px 0;color:{MUTED};font-size:14px;\">{}</p>",
        escape(text)
    ))
}

pub fn timestamp_line(label: &str, when: &str) -> Html {
    Html(format!(
        "<div style=\"margin-top:18px;color:{MUTED};font-size:13px;\">{}: {}</div>",
        escape(label),
        escape(when)
    ))
}

/// Two-column label/value table used for submission details.
#[derive(Debug, Clone)]
pub struct DetailTable {
    title: String,
    rows: Vec<(String, Html)>,
}

impl DetailTable {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn text(mut self, label: &str, value: &str) -> Self {
        self.rows.push((label.to_string(), Html::text(value)));
        self
    }

    pub fn optional_text(self, label: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => self.text(label, value),
            None => self,
        }
    }

    pub fn html(mut self, label: &str, value: Html) -> Self {
        self.rows.push((label.to_string(), value));
        self
    }

    pub fn render(&self) -> Html {
        let mut markup = format!(
            "<table role=\"presentation\" style=\"width:100%;background:#f9fafb;border-radius:6px;padding:14px;border:1px solid rgba(15,23,42,0.04);margin-bottom:14px;\">\
             <tr><td colspan=\"2\" style=\"padding:0 0 8px 0;color:#111827;font-weight:600;border-bottom:1px solid rgba(15,23,42,0.08);\">{}</td></tr>",
            escape(&self.title)
        );
        for (label, value) in &self.rows {
            let _ = write!(
                markup,
                "<tr><td style=\"padding:8px 0;font-size:13px;color:{MUTED};width:150px;vertical-align:top;\">{}</td>\
                 <td style=\"padding:8px 0;color:{INK};font-weight:600;\">{}</td></tr>",
                escape(label),
                value.as_str()
            );
        }
        markup.push_str("</table>");
        Html(markup)
    }
}
