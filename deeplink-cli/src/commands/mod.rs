use clap::Subcommand;

pub mod config;
pub mod handler;
mod install;
mod receive;
mod reply;
mod reset;
mod send;
mod show;

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Read and edit the stored fields")]
    Config {
        #[clap(subcommand)]
        subcommand: config::Config,
    },
    Send(send::Dispatch),
    Receive(receive::Receive),
    Show(show::Show),
    Reset(reset::Reset),
    Reply(reply::Reply),
    #[command(about = "Manage the applications that open links")]
    Handler {
        #[clap(subcommand)]
        subcommand: handler::Handler,
    },
    Install(install::Install),
}
