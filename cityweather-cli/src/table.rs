use cityweather_core::{AggregationResult, WeatherRecord};

/// Render successful rows as an aligned text table with unit-labelled headers.
///
/// Returns an empty string when there are no rows.
pub fn render(result: &AggregationResult) -> String {
    if result.records.is_empty() {
        return String::new();
    }

    let units = &result.units;
    let headers = [
        "Location".to_string(),
        format!("Temp ({})", units.temperature_label),
        "Humidity (%)".to_string(),
        format!("Wind ({})", units.speed_label),
        format!("Pressure ({})", units.pressure_label),
        "Conditions".to_string(),
    ];

    let rows: Vec<[String; 6]> = result.records.iter().map(row).collect();

    let mut widths = headers.each_ref().map(|h| h.chars().count());
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for r in &rows {
        push_line(&mut out, r, &widths);
    }
    out
}

fn row(record: &WeatherRecord) -> [String; 6] {
    [
        record.location.clone(),
        format!("{:.1}", record.temperature),
        record.humidity.to_string(),
        format!("{:.1}", record.wind_speed),
        record.pressure.to_string(),
        record.description.clone(),
    ]
}

// Text columns are left-aligned, numeric ones right-aligned.
fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| match i {
            0 | 5 => format!("{cell:<w$}"),
            _ => format!("{cell:>w$}"),
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityweather_core::{RunStatus, UnitSelection};

    fn result(units: UnitSelection, records: Vec<WeatherRecord>) -> AggregationResult {
        AggregationResult {
            requested: records.len(),
            records,
            status: RunStatus::Complete,
            failures: vec![],
            units: units.resolve(),
        }
    }

    fn record(location: &str, temperature: f64) -> WeatherRecord {
        WeatherRecord {
            location: location.into(),
            temperature,
            humidity: 65,
            wind_speed: 12.0,
            pressure: 1015,
            description: "Partly cloudy".into(),
        }
    }

    #[test]
    fn empty_result_renders_nothing() {
        assert_eq!(render(&result(UnitSelection::Imperial, vec![])), "");
    }

    #[test]
    fn headers_carry_unit_labels() {
        let text = render(&result(UnitSelection::Metric, vec![record("Boston", 3.3)]));
        let header = text.lines().next().expect("header line");

        assert!(header.contains("Temp (°C)"));
        assert!(header.contains("Wind (km/h)"));
        assert!(header.contains("Pressure (mb)"));
    }

    #[test]
    fn rows_follow_record_order_and_align() {
        let text = render(&result(
            UnitSelection::Imperial,
            vec![record("New York", 42.0), record("San Jose", 62.25)],
        ));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("New York"));
        assert!(lines[3].starts_with("San Jose"));
        assert!(lines[3].contains("62.2") || lines[3].contains("62.3"));
        assert_eq!(lines[2].chars().count(), lines[3].chars().count());
    }
}
