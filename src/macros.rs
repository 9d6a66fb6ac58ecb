#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Classification`](crate::Classification) from literal meaning IDs
/// and utterances, returning the validation result.
///
/// ```
/// use meaning_map::classification;
///
/// let c = classification! {
///     "1" => ["add to cart"],
///     "2" => ["remove from cart", "take out of cart"],
/// }
/// .unwrap();
/// assert_eq!(c.len(), 3);
/// ```
#[macro_export]
macro_rules! classification {
    ( $( $meaning:expr => [ $($utterance:expr),* $(,)? ] ),* $(,)? ) => {
        $crate::Classification::new(vec![
            $( ($meaning, vec![ $($utterance),* ]) ),*
        ])
    };
}
