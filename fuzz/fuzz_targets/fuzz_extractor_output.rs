#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_graph::assembly::build_bom_ns_data;
use sbom_graph::extractors::ExtractorOutput;
use sbom_graph::model::SpecVersion;

/// Fuzz extractor JSON decoding and single-result assembly.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(output) = ExtractorOutput::from_json(s) {
            for version in [SpecVersion::V1_4, SpecVersion::V1_6] {
                if let Some(bom) = build_bom_ns_data(version, output.clone()) {
                    let _ = bom.to_json(false);
                }
            }
        }
    }
});
