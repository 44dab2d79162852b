//! Hex dumps of raw frames for debug logging

/// Render at most `max_bytes` of `data` as space-separated hex, with `...` when truncated
pub fn hex_dump(data: &[u8], max_bytes: usize) -> String {
    let shown = &data[..data.len().min(max_bytes)];
    let mut out = shown
        .chunks(1)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join(" ");

    if data.len() > max_bytes {
        out.push_str(" ...");
    }

    out
}
