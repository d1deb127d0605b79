// ── Static route file codec ──
//
// Route files hold one route per line in whitespace-separated columns:
// destination, gateway, netmask, device, options. `-` marks an absent
// column and `#` starts a comment line.

use tracing::warn;

use crate::model::{EntityId, Route};

/// Placeholder for an absent column.
pub const ABSENT: &str = "-";

/// Minimum number of columns a route line must have. The trailing
/// options column may be left out.
const MIN_COLUMNS: usize = 4;

/// Parse route file text.
///
/// `default_device` is the interface an `ifroute-<name>` file belongs to;
/// it fills the device column of routes that leave it absent. Pass `None`
/// for the global routes file.
///
/// Lines with fewer than four columns are skipped with a warning and
/// parsing continues. Columns past the fifth belong to the options, which
/// are kept as a single space-joined value.
pub fn decode_routes(text: &str, default_device: Option<&str>) -> Vec<Route> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| decode_line(index + 1, line, default_device))
        .collect()
}

fn decode_line(line_no: usize, line: &str, default_device: Option<&str>) -> Option<Route> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    // split_whitespace collapses runs of spaces and tabs.
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < MIN_COLUMNS {
        warn!(
            line = line_no,
            columns = columns.len(),
            "skipping malformed route line"
        );
        return None;
    }

    // A `-` options column followed by more text leaves only the text.
    let extra = &columns[MIN_COLUMNS..];
    let extra = match extra.split_first() {
        Some((&first, rest)) if first == ABSENT => rest,
        _ => extra,
    };
    let options = column(&extra.join(" "));

    Some(Route {
        id: EntityId::generate(),
        destination: column(columns[0]),
        gateway: column(columns[1]),
        netmask: column(columns[2]),
        device: column(columns[3]).or_else(|| default_device.map(str::to_owned)),
        options,
    })
}

fn column(raw: &str) -> Option<String> {
    (raw != ABSENT && !raw.is_empty()).then(|| raw.to_owned())
}

/// Render routes as route file text.
///
/// The device column is always written as `-`: the file a route is
/// written to determines its device. Columns are tab-separated; the
/// result ends with a newline unless there are no routes.
pub fn encode_routes(routes: &[Route]) -> String {
    let mut out = String::new();
    for route in routes {
        let columns = [
            route.destination.as_deref(),
            route.gateway.as_deref(),
            route.netmask.as_deref(),
            None,
            route.options.as_deref(),
        ];
        let line: Vec<&str> = columns.iter().map(|c| c.unwrap_or(ABSENT)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}
