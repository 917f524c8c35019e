mod stats;
mod terminal;
#[cfg(test)]
mod tests;
mod view;

pub use stats::DisplayStats;
pub use terminal::TerminalDisplay;
pub use view::compose;
