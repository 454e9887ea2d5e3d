use terminal_size::{terminal_size, Width};

/// Width to wrap `--help` output at; falls back to 100 columns when
/// stdout is not a terminal.
pub fn get_terminal_width() -> usize {
    if let Some((Width(width), _)) = terminal_size() {
        usize::from(width)
    } else {
        100
    }
}
