use std::io::Write;

pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(buf, "[{:<5}] {}", record.level(), record.args())
        })
        .init();
}
