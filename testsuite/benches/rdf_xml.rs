use arp_api::handler::{ErrorHandler, ExtendedHandler, HandlerResult, NamespaceHandler, StatementHandler};
use arp_api::model::{AResource, ALiteral};
use arp_testsuite::recorder::Recorder;
use arp_xml::{ErrorModes, ParserOptions, RdfXmlParser};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// A document mixing the usual constructs, repeated `count` times.
fn generated_document(count: usize) -> Vec<u8> {
    let mut data = String::from(
        "<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:ex=\"http://example.org/vocab#\" xml:base=\"http://example.org/data/\">\n",
    );
    for i in 0..count {
        data.push_str(&format!(
            r#"<ex:Person rdf:about="person/{i}" ex:name="Person {i}" xml:lang="en">
  <ex:knows rdf:resource="person/{next}"/>
  <ex:age rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">{age}</ex:age>
  <ex:address rdf:parseType="Resource"><ex:city>City {i}</ex:city></ex:address>
  <ex:tags rdf:parseType="Collection"><ex:Tag rdf:about="tag/a"/><ex:Tag rdf:about="tag/b"/></ex:tags>
  <ex:bio rdf:parseType="Literal"><b xmlns="http://www.w3.org/1999/xhtml">bio</b> {i}</ex:bio>
  <ex:aliases><rdf:Bag><rdf:li>P{i}</rdf:li><rdf:li xml:lang="fr">Pers. {i}</rdf:li></rdf:Bag></ex:aliases>
</ex:Person>
"#,
            i = i,
            next = i + 1,
            age = i % 90
        ));
    }
    data.push_str("</rdf:RDF>\n");
    data.into_bytes()
}

#[derive(Default)]
struct Count(usize);

impl StatementHandler for Count {
    fn statement(&mut self, _: &AResource, _: &AResource, _: &AResource) -> HandlerResult {
        self.0 += 1;
        Ok(())
    }

    fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
        self.0 += 1;
        Ok(())
    }
}

impl NamespaceHandler for Count {}

impl ExtendedHandler for Count {}

impl ErrorHandler for Count {}

fn parse_bench(c: &mut Criterion, group_name: &str, data: &[u8], bench: impl Fn(&[u8])) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter("generated"), data, |b, data| {
        b.iter(|| bench(data))
    });
    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let data = generated_document(1000);
    parse_bench(c, "rdf_xml_streaming", &data, |data| {
        let mut count = Count::default();
        RdfXmlParser::new().parse(data, &mut count).unwrap();
    });
}

fn bench_buffered(c: &mut Criterion) {
    let data = generated_document(1000);
    parse_bench(c, "rdf_xml_buffered", &data, |data| {
        let mut count = Count::default();
        RdfXmlParser::new().parse_buffered(data, &mut count).unwrap();
    });
}

fn bench_strict_recording(c: &mut Criterion) {
    let data = generated_document(1000);
    let parser = RdfXmlParser::new().with_options(ParserOptions {
        error_modes: ErrorModes::strict(),
        ..ParserOptions::default()
    });
    parse_bench(c, "rdf_xml_strict_recording", &data, |data| {
        let mut recorder = Recorder::new();
        parser.parse(data, &mut recorder).unwrap();
    });
}

criterion_group!(
    rdf_xml,
    bench_streaming,
    bench_buffered,
    bench_strict_recording
);

criterion_main!(rdf_xml);
