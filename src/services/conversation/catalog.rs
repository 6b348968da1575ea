use crate::models::{Catalog, Service};

use super::normalize::normalize;

// Display grouping only; matching never looks at categories. Categories
// missing from this table are not rendered.
const CATEGORY_DISPLAY: &[(&str, &str)] = &[
    ("Depilação", "✨"),
    ("Estética Facial", "💆‍♀️"),
    ("Cílios & Sobrancelhas", "👁️"),
    ("Design na Linha", "✂️"),
    ("Tratamentos Corporais", "💎"),
    ("Nail Designer", "💅"),
    ("Manicure & Pedicure", "🌸"),
];

/// Resolve a service from customer text. A fully numeric message is a
/// 1-based menu ordinal into the catalog's declared order and wins over
/// name matching; otherwise the first service whose normalized name occurs
/// in the normalized text is taken.
pub fn find_service<'a>(catalog: &'a Catalog, text: &str) -> Option<&'a Service> {
    let text = normalize(text);

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        let ordinal: usize = text.parse().ok()?;
        return ordinal.checked_sub(1).and_then(|i| catalog.get(i));
    }

    catalog
        .services
        .iter()
        .find(|service| text.contains(&normalize(&service.name)))
}

/// The numbered menu, grouped by category in the fixed display order.
pub fn render_menu(catalog: &Catalog) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut number = 1;

    for (category, icon) in CATEGORY_DISPLAY {
        let services: Vec<&Service> = catalog
            .services
            .iter()
            .filter(|s| s.category == *category)
            .collect();
        if services.is_empty() {
            continue;
        }

        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{icon} *{}*", category.to_uppercase()));

        for service in services {
            lines.push(format!("{number}. {} — {}", service.name, service.price));
            number += 1;
        }
    }

    lines.join("\n")
}
