use super::markup::{escape, external_link, mailto, tel, Html, ACCENT, MUTED};
use super::BrandProfile;

/// Table-based shell with inline styles only, so it survives webmail sanitisers.
pub(super) fn wrap(brand: &BrandProfile, body: Html, year: i32) -> String {
    format!(
        "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width,initial-scale=1\"><title>{name}</title></head>\
<body style=\"margin:0;padding:0;background:#f3f4f6;font-family:Arial,Helvetica,sans-serif;\">\
<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"background:#f3f4f6;padding:24px 0;\"><tr><td align=\"center\">\
<table role=\"presentation\" width=\"600\" cellpadding=\"0\" cellspacing=\"0\" style=\"max-width:600px;width:100%;background:#ffffff;border-radius:10px;overflow:hidden;\">\
{header}\
<tr><td style=\"padding:28px 32px;\">{body}{button}</td></tr>\
{footer}\
</table></td></tr></table></body></html>",
        name = escape(&brand.name),
        header = header(brand).as_str(),
        body = body.as_str(),
        button = website_button(brand).as_str(),
        footer = footer(brand, year).as_str(),
    )
}

fn header(brand: &BrandProfile) -> Html {
    let logo = brand
        .logo_url
        .as_deref()
        .filter(|url| is_http(url))
        .map(|url| {
            format!(
                "<img src=\"{}\" alt=\"{}\" width=\"48\" height=\"48\" style=\"display:block;margin:0 auto 10px auto;border-radius:8px;\">",
                escape(url),
                escape(&brand.name)
            )
        })
        .unwrap_or_default();

    Html::trusted(format!(
        "<tr><td style=\"background:{ACCENT};padding:24px 32px;text-align:center;\">{logo}\
         <div style=\"color:#ffffff;font-size:20px;font-weight:700;\">{}</div>\
         <div style=\"color:#e0e7ff;font-size:13px;margin-top:4px;\">{}</div></td></tr>",
        escape(&brand.name),
        escape(&brand.tagline)
    ))
}

fn website_button(brand: &BrandProfile) -> Html {
    if !is_http(&brand.website) {
        return Html::default();
    }
    Html::trusted(format!(
        "<div style=\"text-align:center;margin-top:26px;\">\
         <a href=\"{}\" style=\"display:inline-block;background:{ACCENT};color:#ffffff;padding:12px 24px;border-radius:6px;text-decoration:none;font-weight:600;font-size:14px;\">Visit Website &rarr;</a></div>",
        escape(brand.website.trim())
    ))
}

fn footer(brand: &BrandProfile, year: i32) -> Html {
    let mut lines = Vec::new();
    if let Some(address) = brand.address.as_deref() {
        lines.push(escape(address));
    }
    let mut reach = mailto(&brand.contact_email).into_string();
    if let Some(phone) = brand.contact_phone.as_deref() {
        reach.push_str(" &middot; ");
        reach.push_str(tel(phone).as_str());
    }
    lines.push(reach);
    lines.push(external_link(&brand.website, &brand.website).into_string());

    let rows: String = lines
        .iter()
        .map(|line| format!("<div style=\"margin-bottom:4px;\">{line}</div>"))
        .collect();

    Html::trusted(format!(
        "<tr><td style=\"background:#f9fafb;padding:20px 32px;text-align:center;color:{MUTED};font-size:12px;border-top:1px solid #e5e7eb;\">\
         {rows}<div style=\"margin-top:10px;\">&copy; {year} {}. All rights reserved.</div></td></tr>",
        escape(&brand.name)
    ))
}

fn is_http(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
