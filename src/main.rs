#[tokio::main]
async fn main() {
    if let Err(e) = clinic_scheduler_lib::run().await {
        eprintln!("clinic-scheduler: {e}");
        std::process::exit(1);
    }
}
