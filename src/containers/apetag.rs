//! Standalone APEv2 "container"
//!
//! A file that starts with an `APETAGEX` header carries nothing but the
//! tag itself; the shared APE decoder does all the work.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::Tokenizer;
use crate::tags::apev2;

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("APEv2");
    apev2::parse(t, c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferTokenizer;
    use crate::options::ProbeOptions;
    use crate::tags::apev2::build;

    #[test]
    fn test_standalone_tag() {
        let bytes = build::tag(&[build::text_item("Title", "Only Tags")]);
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(&bytes), &mut c).unwrap();

        assert_eq!(c.format.container.as_deref(), Some("APEv2"));
        assert_eq!(c.common.title.as_deref(), Some("Only Tags"));
    }
}
