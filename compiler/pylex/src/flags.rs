//! Tokenizer construction flags.

use bitflags::bitflags;

bitflags! {
    /// Behavior switches fixed at construction time.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        /// File/exec input: synthesize a trailing newline before EOF when
        /// the source does not end with one.
        const EXEC_INPUT = 1 << 0;
        /// Interactive (REPL) input: underflow reports incomplete source
        /// instead of ending the stream, blank lines terminate command
        /// groups, and a comment-only first line is let through.
        const INTERACTIVE = 1 << 1;
        /// Recognize `# type:` comments as `TypeComment`/`TypeIgnore`
        /// tokens instead of skipping them.
        const TYPE_COMMENT = 1 << 2;
        /// Treat `async`/`await` as keywords only inside `async def`
        /// functions, using one token of lookahead after `async`.
        const ASYNC_HACKS = 1 << 3;
        /// Tooling mode: emit `Comment` and `Nl` tokens, tolerate leading
        /// zeros in decimal literals and bracket mismatches.
        const EXTRA_TOKENS = 1 << 4;
    }
}
