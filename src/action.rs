#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Tick,
    ScrollUp(u16),
    ScrollDown(u16),
    Resize { cols: u16, rows: u16 },
}
