/// Creates a single provider [`Turn`](crate::Turn) from a role shorthand.
///
/// ```rust
/// use brook::{Role, brook_turn};
///
/// let turn = brook_turn!(assistant => "Done.");
/// assert_eq!(turn.role, Role::Assistant);
/// assert_eq!(turn.content, "Done.");
/// ```
#[macro_export]
macro_rules! brook_turn {
    (system => $content:expr $(,)?) => {
        $crate::Turn::system($content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Turn::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Turn::assistant($content)
    };
    (tool => $content:expr $(,)?) => {
        $crate::Turn::tool($content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or tool");
    };
}

/// Creates a `Vec<Turn>` from role/content pairs.
///
/// ```rust
/// use brook::{Role, brook_turns};
///
/// let turns = brook_turns![
///     system => "You are a helpful assistant!",
///     user => "What is in file 1?",
/// ];
///
/// assert_eq!(turns.len(), 2);
/// assert_eq!(turns[0].role, Role::System);
/// assert_eq!(turns[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! brook_turns {
    () => {
        Vec::<$crate::Turn>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::brook_turn!($role => $content)),+]
    };
}
