//! Text helpers for error messages: resolution chains, short type names
//! and "did you mean" suggestions.

/// Separator placed between the entries of a rendered chain.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Shortest shared prefix that still counts as a near miss.
const MIN_SHARED_PREFIX: usize = 3;

/// Renders a resolution chain on one line.
///
/// # Examples
/// ```
/// use wirebox_support::rendering::render_chain;
///
/// let chain = vec!["Session", "Repository", "Session"];
/// assert_eq!(render_chain(&chain), "Session -> Repository -> Session");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut rendered = String::new();
    for (index, entry) in chain.iter().enumerate() {
        if index > 0 {
            rendered.push_str(CHAIN_SEPARATOR);
        }
        rendered.push_str(entry.as_ref());
    }
    rendered
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&')
}

/// Strips module paths from every path inside a type name.
///
/// ```
/// use wirebox_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("game::audio::mixer::Mixer");
/// assert_eq!(short, "Mixer");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn game::audio::Channel>");
/// assert_eq!(short, "Arc<dyn Channel>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut rest = full_name;

    while !rest.is_empty() {
        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        let (path, tail) = rest.split_at(end);
        short.push_str(path.rsplit("::").next().unwrap_or(path));

        let mut tail_chars = tail.chars();
        if let Some(delimiter) = tail_chars.next() {
            short.push(delimiter);
        }
        rest = tail_chars.as_str();
    }

    short
}

/// How closely a bound name matches the requested one. Declared from
/// weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Match {
    SharedPrefix(usize),
    ShortName,
    FullName,
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn rank(requested: &str, requested_short: &str, candidate: &str) -> Option<Match> {
    let candidate_full = candidate.to_lowercase();
    if overlaps(&candidate_full, requested) {
        return Some(Match::FullName);
    }

    let candidate_short = shorten_type_name(candidate).to_lowercase();
    if overlaps(&candidate_short, requested_short) {
        return Some(Match::ShortName);
    }

    let shared = candidate_short
        .chars()
        .zip(requested_short.chars())
        .take_while(|(a, b)| a == b)
        .count();
    (shared >= MIN_SHARED_PREFIX).then_some(Match::SharedPrefix(shared))
}

/// Suggests bound type names that look like `requested`, best first.
///
/// A name containing (or contained in) the requested one ranks first,
/// then the same test on shortened names, then the longest shared prefix
/// of the shortened names. The requested name itself is never suggested.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_full = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut ranked: Vec<(Match, &str)> = available
        .iter()
        .copied()
        .filter(|&name| name != requested)
        .filter_map(|name| rank(&requested_full, &requested_short, name).map(|m| (m, name)))
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}
