#![no_main]
use arp_api::handler::NoHandler;
use arp_xml::{ErrorModes, ParserOptions, RdfXmlParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = RdfXmlParser::new()
        .with_base_uri("http://example.com/")
        .parse(data, &mut NoHandler);
    let _ = RdfXmlParser::new()
        .with_options(ParserOptions {
            error_modes: ErrorModes::strict(),
            embedding: true,
            ..ParserOptions::default()
        })
        .parse(data, &mut NoHandler);
});
