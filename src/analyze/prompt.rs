//! Prompt construction for the market-impact question.

const INSTRUCTIONS: &str = "You are a financial markets analyst. Decide whether the social-media post below could plausibly move the price of a specific stock, a sector, or the broad market.

Reply with ONLY a JSON object, no prose and no code fences, with exactly these keys:
  \"relevant\": true or false,
  \"direction\": one of \"UP\", \"DOWN\", \"MENTIONED\" (named but no clear direction), \"NONE\",
  \"subjects\": list of affected tickers or sectors (empty list when not relevant),
  \"rationale\": one or two sentences explaining the call.
Use \"NONE\" and an empty list when the post is not market-relevant, and never use \"NONE\" when it is.";

/// Build the full prompt for one post. A blank `focus` is treated as absent.
pub fn build_prompt(post_text: &str, focus: Option<&str>) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + post_text.len() + 128);
    prompt.push_str(INSTRUCTIONS);

    if let Some(f) = focus.map(str::trim).filter(|f| !f.is_empty()) {
        prompt.push_str("\n\nThe operator is especially interested in: ");
        prompt.push_str(f);
        prompt.push_str(
            "\nMark the post relevant if it bears on that focus, and list the matching subjects first.",
        );
    }

    prompt.push_str("\n\nPost:\n\"\"\"\n");
    prompt.push_str(post_text);
    prompt.push_str("\n\"\"\"");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_is_embedded_when_present() {
        let p = build_prompt("Drill, baby, drill", Some("  energy stocks "));
        assert!(p.contains("especially interested in: energy stocks\n"));
        assert!(p.ends_with("Drill, baby, drill\n\"\"\""));
    }

    #[test]
    fn blank_focus_is_ignored() {
        let with_blank = build_prompt("text", Some("   "));
        assert_eq!(with_blank, build_prompt("text", None));
        assert!(!with_blank.contains("especially interested"));
    }
}
