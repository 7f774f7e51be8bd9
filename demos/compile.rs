use miette::Report;
use resource_compiler::diagnostic::ApiError;
use resource_compiler::{render_failures, Compiler};
use std::path::PathBuf;

// Usage: cargo run --example compile -- <project-dir> [error-response.json]
//
// Prints the deploy request body, or, given a saved server error response,
// the diagnostics for it.
fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let root = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let compiler = Compiler::new(&root);
    let bundle = compiler.compile()?;

    let Some(response_path) = args.next() else {
        if bundle.is_empty() {
            eprintln!("no resource available in {}", root.display());
            return Ok(());
        }
        println!("{}", bundle.to_json_pretty().map_err(|e| miette::miette!("{e}"))?);
        return Ok(());
    };

    let response = std::fs::read_to_string(&response_path)
        .map_err(|e| miette::miette!("cannot read {response_path}: {e}"))?;
    let api_error: ApiError =
        serde_json::from_str(&response).map_err(|e| miette::miette!("invalid error response: {e}"))?;

    match api_error.invalid_request_body() {
        Ok(Some(body)) => match render_failures(&bundle, &body.jsv_errors) {
            Ok(text) => println!("invalid resources:\n{text}"),
            Err(err) => eprintln!("{:?}", Report::new(err)),
        },
        Ok(None) => println!("request failed: {api_error}"),
        Err(e) => eprintln!("invalid error data: {e}"),
    }
    Ok(())
}
