//! Fuzz target for the fiscal rule battery.
//!
//! Any table carrying the mandatory columns must validate without panicking,
//! whatever the cell contents are.

#![no_main]

use fiscalscope::validation::run_core_validations;
use fiscalscope::Parser;
use libfuzzer_sys::fuzz_target;

const HEADER: &str = "chave_acesso;numero;numero_item;cfop;destino_operacao;ncm;quantidade;valor_unitario;valor_total_item;valor_total_nota;cnpj_emitente;aliquota_icms;base_icms;valor_icms";

fuzz_target!(|data: &[u8]| {
    if data.len() > 20_000 {
        return;
    }

    if let Ok(body) = std::str::from_utf8(data) {
        let text = format!("{}\n{}", HEADER, body);
        if let Ok(dataset) = Parser::new().parse_str(&text) {
            let _ = run_core_validations(&dataset);
        }
    }
});
