use crate::analysis::token::TokenStream;

pub trait TokenFilter: Send + Sync {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a>;

    fn name(&self) -> &str;
}
