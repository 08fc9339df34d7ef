//! File names for generated graphics.

/// Prompt characters kept in a file name.
const PROMPT_CHARS: usize = 20;

/// File stem for a generated graphic: `graphic_{index}_{unix_ts}_{prompt}`.
///
/// The prompt part keeps the first 20 characters, with every
/// non-alphanumeric character replaced by `_`. The stem is recognized by
/// `AssetMap::discover`.
pub fn asset_file_stem(index: usize, prompt: &str) -> String {
    asset_file_stem_at(index, prompt, chrono::Utc::now().timestamp())
}

pub fn asset_file_stem_at(index: usize, prompt: &str, unix_ts: i64) -> String {
    format!("graphic_{index}_{unix_ts}_{}", safe_prompt(prompt))
}

fn safe_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .take(PROMPT_CHARS)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
