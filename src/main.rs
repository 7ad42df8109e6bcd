mod config;

mod context;

mod errors;

mod init;

mod verdict;

mod language {
    pub(crate) mod command;
    pub(crate) mod plugin;
    pub(crate) mod registry;

    pub(crate) mod languages {
        pub(crate) mod assembly_nasm;
        pub(crate) mod c11_gcc;
        pub(crate) mod cpp17_gpp;
        pub(crate) mod pascal_fpc;
        pub(crate) mod python3_cpython;
        pub(crate) mod rust_rustc;
    }
}

mod harness {
    pub(crate) mod compiler;
    pub(crate) mod sandbox;
    pub(crate) mod submission;
}

mod ranking {
    pub(crate) mod cache;
    pub(crate) mod contest;
    pub(crate) mod scheduler;
    pub(crate) mod view;
}

mod web {
    pub(crate) mod handlers;
    pub(crate) mod router;
    pub(crate) mod templates;
}

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    init::main().await
}
