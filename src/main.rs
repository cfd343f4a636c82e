use clap::Parser;
use std::process::ExitCode;

use rivalscope_rs::cli::Args;
use rivalscope_rs::generator::outlet::error_object;
use rivalscope_rs::{launch, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let json_output = args.json;
    logging::init(args.verbose);

    let request = match args.into_request() {
        Ok(request) => request,
        Err(e) => {
            report_failure(json_output, &e);
            return ExitCode::FAILURE;
        }
    };

    match launch(&request.config, &request.subject_id, &request.keyword).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(request.config.json_output, &e);
            ExitCode::FAILURE
        }
    }
}

/// 硬失败：JSON模式下打印错误对象，否则打印可读错误
fn report_failure(json_output: bool, error: &anyhow::Error) {
    tracing::error!("❌ 分析中止: {:#}", error);
    let object = error_object(error);
    if json_output {
        println!("{}", object);
    } else {
        eprintln!(
            "Error: {}",
            object["message"].as_str().unwrap_or_default()
        );
    }
}
