use comfy_table::Table;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;

/// Create a styled table for output
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table
}

/// Render vault bytes for display, hex-encoding anything that is not UTF-8.
pub fn display_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}

/// Join displayed values with commas.
pub fn join_values<'a>(values: impl Iterator<Item = &'a [u8]>) -> String {
    values.map(display_bytes).collect::<Vec<_>>().join(", ")
}
