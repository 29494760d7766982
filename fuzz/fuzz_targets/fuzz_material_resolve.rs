#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Material resolution must never panic and must always produce a usable
    // descriptor, whatever crowdsourced garbage comes in.
    let table = kerf_config::MaterialTable::builtin();
    let resolved = table.resolve(data);
    assert!(resolved.props.density.is_finite());
    assert!(resolved.props.absorb.is_finite());
});
