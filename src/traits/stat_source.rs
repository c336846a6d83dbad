/// Local resource sampling. Values are opaque strings; the backend parses them.
#[trait_variant::make(StatSource: Send)]
pub trait UnsendStatSource {
    async fn cpu(&self) -> String;
    async fn memory(&self) -> String;
    async fn network(&self) -> String;
}
