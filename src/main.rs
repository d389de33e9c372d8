//! `smis` 바이너리 진입점.

use smis_client::application::usecases::dispatch::DispatchOutcome;
use smis_client::domain::error::CimError;
use smis_client::interface::cli::{AppComposition, Cli, CliAction};

#[tokio::main]
async fn main() {
    // stdout은 결과 출력 전용이므로 로그는 stderr로 보낸다.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let action = Cli::parse_action();

    let composition = AppComposition::default();

    match action {
        CliAction::InspectConfig => match composition.inspect_config_usecase().execute() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        },
        CliAction::Invoke(request) => {
            match composition.invoke_operation_usecase().execute(request).await {
                Ok(DispatchOutcome::Completed { rendered }) => {
                    tracing::debug!(rendered, "done");
                }
                // 원격 실패는 이미 stderr로 보고했다.
                Ok(DispatchOutcome::RemoteFailed(_)) => {}
                Err(err) => {
                    eprintln!("error: {err:#}");
                    let input_error = err
                        .downcast_ref::<CimError>()
                        .is_some_and(CimError::is_input_error);
                    std::process::exit(if input_error { 2 } else { 1 });
                }
            }
        }
    }
}
