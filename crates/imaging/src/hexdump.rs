//! Byte-level dump helper for codec debugging.

const BYTES_PER_LINE: usize = 16;

/// Format `data` as an offset + hex + ASCII dump, 16 bytes per line.
///
/// ```
/// let dump = imaging::hexdump(b"BM\x36\x00");
/// assert!(dump.starts_with("00000000  42 4d 36 00"));
/// assert!(dump.trim_end().ends_with("BM6."));
/// ```
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4);

    for (line, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        out.push_str(&format!("{:08x}  ", line * BYTES_PER_LINE));

        for index in 0..BYTES_PER_LINE {
            match chunk.get(index) {
                Some(byte) => out.push_str(&format!("{byte:02x} ")),
                None => out.push_str("   "),
            }
        }

        out.push(' ');
        for byte in chunk {
            out.push(if byte.is_ascii_graphic() || *byte == b' ' {
                *byte as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }

    out
}
