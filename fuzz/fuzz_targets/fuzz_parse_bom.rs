#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_graph::config::FilterConfig;
use sbom_graph::pipeline::parse_bom_str;
use sbom_graph::postgen::post_process;

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz document parsing followed by the post-generation passes.
///
/// Input is also wrapped as a component array so that lenient component
/// parsing and the filter see more than malformed envelopes.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let options = FilterConfig {
            required_only: true,
            filter: vec!["test".to_string()],
            ..FilterConfig::default()
        };

        if let Ok(bom) = parse_bom_str(s) {
            let _ = post_process(bom, &options, None);
        }

        if s.len() < MAX_WRAPPED_INPUT_LEN {
            let wrapped = format!(
                r#"{{"bomFormat":"CycloneDX","specVersion":"1.5","components":[{s}]}}"#,
            );
            if let Ok(bom) = parse_bom_str(&wrapped) {
                let _ = post_process(bom, &options, None);
            }
        }
    }
});
