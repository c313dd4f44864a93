//! Hex formatting for opaque record spans and raw record dumps.
//!
//! The record codec keeps several byte spans it cannot interpret; these
//! helpers render them compactly for listings and as a traditional hex dump
//! with offset column and ASCII sidebar for `smsdb dump`.

/// Format bytes as a compact hex string (e.g., "4a2f00ff").
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Produce a standard hex dump of `data` with the given `base_offset`.
///
/// Output format (16 bytes per line):
/// ```text
/// 00000000  xx xx xx xx xx xx xx xx  xx xx xx xx xx xx xx xx  |................|
/// ```
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut lines = Vec::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        let offset = base_offset + (i * 16) as u64;

        // Offset column
        let mut line = format!("{:08x}  ", offset);

        // Hex columns (two groups of 8 bytes separated by extra space)
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                line.push(' ');
            }
            line.push_str(&format!("{:02x} ", byte));
        }

        // Pad short last line
        if chunk.len() < 16 {
            let missing = 16 - chunk.len();
            for j in 0..missing {
                if chunk.len() + j == 8 {
                    line.push(' ');
                }
                line.push_str("   ");
            }
        }

        // ASCII column
        line.push(' ');
        line.push('|');
        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                line.push(*byte as char);
            } else {
                line.push('.');
            }
        }
        // Pad ASCII column for short last line
        for _ in chunk.len()..16 {
            line.push(' ');
        }
        line.push('|');

        lines.push(line);
    }

    lines.join("\n")
}
