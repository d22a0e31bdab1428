//! Rewrite instruction sent to the language model.

/// Render the rewrite prompt.
///
/// The template is fixed; only the four inputs are substituted, verbatim.
#[must_use]
pub fn build_prompt(title: &str, artist: &str, theme: &str, original_lyrics: &str) -> String {
    format!(
        "Take the following lyrics from the song \"{title}\" by {artist} and rewrite them in the theme of \"{theme}\".\n\
         Focus on inserting puns and being clever. You MUST ALWAYS match the rhythm, syllable count, \
         and rhyme structure exactly with the original lyrics.\n\
         Do not explain your answer or include any commentary. Just return the rewritten lyrics.\n\
         \n\
         Original lyrics:\n\
         {original_lyrics}"
    )
}
