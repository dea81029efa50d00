use rsp_classifier::config::AppConfig;
use rsp_classifier::viewer::SystemOpener;
use rsp_classifier::{run, ImageClassifier};

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::default();

    let result = ImageClassifier::load(&config.weights_dir).and_then(|classifier| {
        run(
            &config,
            &classifier,
            &SystemOpener,
            &mut rand::rng(),
            &mut std::io::stdout(),
        )
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
