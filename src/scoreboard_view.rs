use crate::scoreboard_client::Scoreboard;

const NAME_HEADER: &str = "Name";
const SCORE_HEADER: &str = "Score";

/// Renders the board as a bordered two-column table, rows in server order.
pub fn render_table(board: &Scoreboard) -> String {
    let rows: Vec<(String, String)> = board.participants.iter()
        .map(|e| (e.name.clone(), e.score.to_string()))
        .collect();

    let name_width = rows.iter().map(|e| e.0.chars().count()).max().unwrap_or(0).max(NAME_HEADER.len());
    let score_width = rows.iter().map(|e| e.1.len()).max().unwrap_or(0).max(SCORE_HEADER.len());
    let border = format!("+-{}-+-{}-+", "-".repeat(name_width), "-".repeat(score_width));

    let mut out = Vec::with_capacity(rows.len() + 5);
    out.push(format!("Game {}", board.game_code));
    out.push(border.clone());
    out.push(format!("| {:<name_width$} | {:>score_width$} |", NAME_HEADER, SCORE_HEADER));
    out.push(border.clone());
    for (name, score) in &rows {
        out.push(format!("| {:<name_width$} | {:>score_width$} |", name, score));
    }
    if !rows.is_empty() {
        out.push(border);
    }
    out.join("\n")
}
