//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use lsrag_core::{Result, ScoredDocument, TurnEvent};
use lsrag_rag::{Corpus, QueryOutcome, QueryReport};
use std::io::{self, IsTerminal, Write};

const PROMPT: &str = "rag>";
const PREVIEW_CHARS: usize = 50;

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(62, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.green());
    println!("{}", empty_line.green());

    let lines = [
        "KUBECON AGENTIC DEMO",
        "",
        "Retrieval-augmented answers from a Llama Stack agent",
        "",
        "• Local BM25 or server-side scoring retrieval",
        "• Answers cached on disk by query",
    ];

    for line in lines {
        if line.is_empty() {
            println!("{}", empty_line.green());
        } else {
            let padding = (banner_width - 4).saturating_sub(line.chars().count());
            println!("{}", format!("│  {}{}│", line, " ".repeat(padding)).green());
        }
    }

    println!("{}", empty_line.green());
    println!("{}", bottom_border.green());
    println!();
}

/// Header for one demo step, optionally waiting for Enter
pub fn demo_section(title: &str, pause: bool) -> Result<()> {
    let rule = "=".repeat(50);
    println!("\n{}", rule.blue());
    println!("{}", format!(" DEMO STEP: {}", title).blue());
    println!("{}", rule.blue());

    if pause && io::stdin().is_terminal() {
        print!("Press Enter to continue...");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
    }

    Ok(())
}

pub fn print_connection(base_url: &str) {
    println!("{}", format!("Connecting to LLM server at: {}", base_url).yellow());
}

/// Missing files were already reported by the loader's warning
pub fn print_corpus_summary(corpus: &Corpus) {
    println!(
        "{}",
        format!("✓ Processed {} documents ready for retrieval", corpus.len()).green()
    );
}

/// First characters of a document on one line
pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head.replace('\n', " "))
}

/// One line of the top-matches listing
pub fn format_match(rank: usize, scored: &ScoredDocument, text: &str) -> String {
    let score = match scored.score {
        Some(score) => format!("{:.2}", score),
        None => "n/a".to_string(),
    };
    format!("  #{}: Score {} - {}", rank + 1, score, preview(text))
}

/// Print streamed turn events as they arrive
pub fn print_turn_event(event: &TurnEvent) {
    match event {
        TurnEvent::Log(message) => println!("{}", format!("[{}]", message).dimmed()),
        TurnEvent::Delta(text) => {
            print!("{}", text.yellow());
            let _ = io::stdout().flush();
        }
        TurnEvent::Content(_) => println!(),
    }
}

/// Header printed before a query is run
pub fn print_query_header(query: &str) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.magenta());
    println!("{}", format!(" USER PROMPT: '{}'", query).magenta());
    println!("{}", rule.magenta());
}

/// Whether the generated answer made it into the cache file
pub fn cache_status(report: &QueryReport) -> String {
    match &report.persist_error {
        None => "✓ Response cached for future use".to_string(),
        Some(e) => format!("Response not cached: {}", e),
    }
}

/// Narrate each pipeline step of a finished query
pub fn print_query_report(report: &QueryReport, corpus: &Corpus) {
    if report.outcome.is_cached() {
        println!("\n{}", "[STEP 1] Response Cache".blue());
        println!("{}", "✓ Using cached response (instant!)".green());
    } else {
        println!("\n{}", "[STEP 1] Document Retrieval".blue());
        println!(
            "{}",
            format!(
                "✓ Retrieved {} documents in {:.2} seconds",
                report.matches.len(),
                report.retrieval_time.as_secs_f64()
            )
            .green()
        );
        println!("\n{}", "Top matches:".yellow());
        for (rank, scored) in report.matches.iter().enumerate() {
            if let Some(doc) = corpus.documents().get(scored.document_index) {
                println!("{}", format_match(rank, scored, &doc.text).cyan());
            }
        }

        if let Some(prompt) = &report.prompt {
            println!("\n{}", "[STEP 2] Prompt Construction".blue());
            println!(
                "{}",
                format!("✓ Created prompt with {} characters", prompt.chars().count()).green()
            );
            println!("\n{}", "Prompt structure:".yellow());
            println!("{}", "  1. Context from retrieved documents".cyan());
            println!("{}", format!("  2. User query: {}", report.query).cyan());
            println!("{}", "  3. Answer instruction".cyan());
        }

        println!("\n{}", "[STEP 3] Generated Response from model".blue());
        match &report.outcome {
            QueryOutcome::Failed(message) => println!("{}", message.red()),
            _ => {
                println!(
                    "{}",
                    format!(
                        "✓ Generated response in {:.2} seconds",
                        report.generation_time.as_secs_f64()
                    )
                    .green()
                );
                let status = cache_status(report);
                if report.persist_error.is_none() {
                    println!("{}", status.green());
                } else {
                    println!("{}", status.red());
                }
            }
        }
    }

    println!("\n{}", "[FINAL RESPONSE]".blue());
    println!("{}", report.outcome.text().white());
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask a question about the loaded documents", "query".green());
    println!("  {} - Show corpus and cache statistics", "stats".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  When is the demo on AI agents?");
    println!("  Which talks cover observability?");
}

pub fn print_stats(corpus: &Corpus, cached: usize, ranker: &str, top_k: usize) {
    println!("{}", "Statistics:".bold());
    println!("  documents: {}", corpus.len());
    println!("  missing:   {}", corpus.missing().len());
    println!("  cached:    {}", cached);
    println!("  ranker:    {} (top {})", ranker, top_k);
}

/// Handle input with query history navigation
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    // Piped input is read line by line
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok("exit".to_string());
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if !input.is_empty() {
        history.push(input.clone());
    }
    Ok(input)
}

fn redraw(input: &str) -> io::Result<()> {
    print!("\r{} {}  \r{} {}", PROMPT.green().bold(), " ".repeat(50), PROMPT.green().bold(), input);
    io::stdout().flush()
}

fn read_raw_line(history: &[String]) -> Result<String> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    loop {
        if let Event::Key(key_event) = event::read()? {
            match key_event.code {
                KeyCode::Enter => return Ok(input),
                KeyCode::Esc => return Ok(String::new()),
                KeyCode::Char(c) => {
                    input.push(c);
                    redraw(&input)?;
                }
                KeyCode::Backspace => {
                    input.pop();
                    redraw(&input)?;
                }
                KeyCode::Up if !history.is_empty() => {
                    let new_index = match history_index {
                        None => history.len() - 1,
                        Some(idx) => idx.saturating_sub(1),
                    };
                    history_index = Some(new_index);
                    input = history[new_index].clone();
                    redraw(&input)?;
                }
                KeyCode::Down => {
                    if let Some(idx) = history_index {
                        if idx + 1 < history.len() {
                            history_index = Some(idx + 1);
                            input = history[idx + 1].clone();
                        } else {
                            history_index = None;
                            input.clear();
                        }
                        redraw(&input)?;
                    }
                }
                _ => {}
            }
        }
    }
}
