use manifest_core::Passenger;
use manifest_stats::{flight_directory, flight_stats};

// A4 with the margins the printed manifests have always used.
const STYLE: &str = r#"
@page { size: A4; margin: 20px 20px 40px 20px; }
body { font-family: "Helvetica Neue", Arial, sans-serif; color: #1f2937; margin: 0; }
header { border-bottom: 2px solid #1e3a8a; margin-bottom: 16px; padding-bottom: 8px; }
h1 { font-size: 22px; margin: 0 0 4px 0; color: #1e3a8a; }
h2 { font-size: 16px; margin: 0; }
.summary, .meta { font-size: 12px; color: #4b5563; margin: 0; }
section.flight { margin-bottom: 20px; page-break-inside: avoid; }
table { width: 100%; border-collapse: collapse; font-size: 12px; margin-top: 6px; }
th, td { border: 1px solid #d1d5db; padding: 4px 6px; text-align: left; }
th { background: #eff6ff; }
td.num, th.num { text-align: right; }
tfoot td { font-weight: bold; background: #f9fafb; }
.empty { font-style: italic; color: #6b7280; }
"#;

/// Escape text for use inside HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a printable manifest: one section per flight, in the order the
/// flights first appear in `passengers`.
pub fn render_manifest(title: &str, passengers: &[Passenger]) -> String {
    let report = flight_stats(passengers);
    let directory = flight_directory(passengers);
    let title = escape(title);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n", title, STYLE));
    html.push_str(&format!(
        "<header>\n<h1>{}</h1>\n<p class=\"summary\">{} passengers &middot; {} bags &middot; {} kg</p>\n</header>\n",
        title,
        report.summary.total_passengers,
        report.summary.total_baggage,
        report.summary.total_weight
    ));

    if report.flights.is_empty() {
        html.push_str("<p class=\"empty\">No passengers registered.</p>\n");
    }

    for (flight, listing) in report.flights.iter().zip(directory.iter()) {
        html.push_str("<section class=\"flight\">\n");
        html.push_str(&format!(
            "<h2>Flight {}</h2>\n<p class=\"meta\">Scheduled {} &middot; {} passengers</p>\n",
            escape(&flight.flight),
            escape(&listing.scheduled_time),
            flight.total_passengers
        ));
        html.push_str(
            "<table>\n<thead><tr><th>Name</th><th>Number</th><th class=\"num\">Bags</th>\
             <th class=\"num\">Fragile</th><th class=\"num\">Weight (kg)</th></tr></thead>\n<tbody>\n",
        );
        for p in &flight.passengers {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                escape(&p.name),
                escape(&p.number),
                p.bags,
                p.fragile_bags,
                p.weight
            ));
        }
        html.push_str(&format!(
            "</tbody>\n<tfoot><tr><td colspan=\"2\">Total</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr></tfoot>\n</table>\n</section>\n",
            flight.total_baggage, flight.fragile_count, flight.total_weight
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_core::{Baggage, Weight};

    fn passenger(id: i64, name: &str, flight: &str, weights: &[i64]) -> Passenger {
        Passenger {
            id,
            name: name.to_string(),
            number: format!("{:03}", id),
            flight: flight.to_string(),
            scheduled_time: "10:30".to_string(),
            bags: weights
                .iter()
                .enumerate()
                .map(|(i, w)| Baggage {
                    id: id * 10 + i as i64,
                    weight: Weight::from_units(*w),
                    fragile: i == 0,
                    passenger_id: id,
                })
                .collect(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"O'Neil\" & co</b>"), "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn test_manifest_sections_in_first_seen_order() {
        let passengers = vec![
            passenger(1, "Carlos Pereira", "BR789", &[25, 10, 5]),
            passenger(2, "João Silva", "AZ123", &[23, 12]),
            passenger(3, "Ana Lima", "BR789", &[20]),
        ];
        let html = render_manifest("Passenger manifest", &passengers);

        let br = html.find("Flight BR789").unwrap();
        let az = html.find("Flight AZ123").unwrap();
        assert!(br < az);
        assert!(html.contains("3 passengers &middot; 6 bags &middot; 95.00 kg"));
        assert!(html.contains("<td class=\"num\">60.00</td>"));
        assert!(html.contains("João Silva"));
    }

    #[test]
    fn test_manifest_escapes_user_text() {
        let passengers = vec![passenger(1, "<script>alert(1)</script>", "AZ123", &[])];
        let html = render_manifest("Flight <AZ123>", &passengers);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<title>Flight &lt;AZ123&gt;</title>"));
    }

    #[test]
    fn test_empty_manifest() {
        let html = render_manifest("Passenger manifest", &[]);
        assert!(html.contains("No passengers registered."));
        assert!(html.ends_with("</html>\n"));
    }
}
