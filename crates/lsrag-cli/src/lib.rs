//! CLI interface for lsrag

mod ui;

#[cfg(test)]
mod tests;

pub use ui::{
    cache_status, demo_section, display_banner, format_match, handle_input_with_history, preview,
    print_connection, print_corpus_summary, print_help, print_query_header, print_query_report,
    print_stats, print_turn_event,
};

// Re-export core types
pub use lsrag_core::{Error, Result};
