use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

pub fn init_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("relax_room=info"));
    builder.filter_module("wgpu", LevelFilter::Warn);
    builder.filter_module("naga", LevelFilter::Warn);
    builder.filter_module("symphonia", LevelFilter::Warn);

    builder.format(|buf, record| {
        let module_path = record.module_path().unwrap_or("<unknown>");
        writeln!(buf, "[{}][{}] {}", record.level(), module_path, record.args())
    });

    let _ = builder.try_init();
}
