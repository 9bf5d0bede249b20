//! Pipe-delimited route files: `from|to|distance|price|coords_json`.
//!
//! Only `from`, `to` and `distance` are required. Blank lines and lines
//! starting with `#` are ignored. A bad price or coordinate list degrades to
//! "none" instead of rejecting the line.

use crate::models::{Coordinates, NewRoute, Route};

/// Result of reading a whole route file.
#[derive(Debug, Default)]
pub struct ParsedRoutes {
    /// `(line number, route)` for every usable line
    pub routes: Vec<(usize, NewRoute)>,
    /// `(line number, reason)` for every skipped line
    pub skipped: Vec<(usize, String)>,
}

/// Parse one line. `Ok(None)` for blank and comment lines, `Err` when the
/// line is unusable.
pub fn parse_line(line: &str) -> Result<Option<NewRoute>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(format!("expected at least 3 fields, found {}", parts.len()));
    }

    let distance_km: f64 = parts[2]
        .parse()
        .map_err(|_| format!("invalid distance '{}'", parts[2]))?;

    let ticket_price = parts
        .get(3)
        .filter(|p| !p.is_empty())
        .and_then(|p| p.parse::<f64>().ok());

    let coords = parts
        .get(4)
        .filter(|c| !c.is_empty())
        .and_then(|c| serde_json::from_str::<Vec<Coordinates>>(c).ok())
        .unwrap_or_default();

    Ok(Some(NewRoute {
        origin: parts[0].to_string(),
        destination: parts[1].to_string(),
        distance_km,
        ticket_price,
        coords,
        ..Default::default()
    }))
}

pub fn parse_routes(text: &str) -> ParsedRoutes {
    let mut parsed = ParsedRoutes::default();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        match parse_line(line) {
            Ok(Some(route)) => parsed.routes.push((line_no, route)),
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!("Skipping line {}: {}", line_no, reason);
                parsed.skipped.push((line_no, reason));
            }
        }
    }
    parsed
}

/// Render a stored route as one line, without the trailing newline.
pub fn format_line(route: &Route) -> String {
    let price = route
        .ticket_price
        .map(|p| p.to_string())
        .unwrap_or_default();
    let coords = serde_json::to_string(&route.coords).unwrap_or_else(|_| "[]".to_string());

    format!(
        "{}|{}|{}|{}|{}",
        route.origin.replace('|', " "),
        route.destination.replace('|', " "),
        route.distance_km,
        price,
        coords
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn test_full_line() {
        let route = parse_line(
            r#"Delhi|Agra|233|120.0|[{"lat":28.6139,"lng":77.209},{"lat":27.1767,"lng":78.0081}]"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(route.origin, "Delhi");
        assert_eq!(route.destination, "Agra");
        assert_eq!(route.distance_km, 233.0);
        assert_eq!(route.ticket_price, Some(120.0));
        assert_eq!(route.coords.len(), 2);
    }

    #[test]
    fn test_optional_fields_degrade() {
        let route = parse_line(" Mumbai | Pune | 148 | cheap | not-json ")
            .unwrap()
            .unwrap();
        assert_eq!(route.origin, "Mumbai");
        assert_eq!(route.ticket_price, None);
        assert!(route.coords.is_empty());

        let minimal = parse_line("Mumbai|Pune|148").unwrap().unwrap();
        assert_eq!(minimal.ticket_price, None);
    }

    #[test]
    fn test_blank_comment_and_bad_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   # Delhi|Agra|233").unwrap().is_none());
        assert!(parse_line("Delhi|Agra").is_err());
        assert!(parse_line("Delhi|Agra|far").is_err());
    }

    #[test]
    fn test_parse_routes_tracks_line_numbers() {
        let text = "# routes\nDelhi|Agra|233|120\n\nbroken line\nMumbai|Pune|148||[]\n";
        let parsed = parse_routes(text);
        assert_eq!(parsed.routes.len(), 2);
        assert_eq!(parsed.routes[0].0, 2);
        assert_eq!(parsed.routes[1].0, 5);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].0, 4);
    }

    #[test]
    fn test_format_line_reads_back() {
        let route = Route {
            id: 7,
            origin: "Delhi".to_string(),
            destination: "Jaipur".to_string(),
            distance_km: 280.0,
            ticket_price: None,
            duration_min: None,
            coords: vec![Coordinates {
                lat: 28.6139,
                lng: 77.209,
            }],
            stops: vec![],
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let line = format_line(&route);
        assert_eq!(line, r#"Delhi|Jaipur|280||[{"lat":28.6139,"lng":77.209}]"#);

        let back = parse_line(&line).unwrap().unwrap();
        assert_eq!(back.distance_km, 280.0);
        assert_eq!(back.ticket_price, None);
        assert_eq!(back.coords, route.coords);
    }
}
