use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use upacket_link::{LinkConfig, LinkListener};

use crate::cmd::{
    classify_recv_error, install_ctrlc_handler, parse_duration, ListenArgs, RecvErrorDisposition,
};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_received, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = LinkConfig::default().with_timeout(timeout);
    let listener = LinkListener::bind_with_config(&args.addr, config)
        .map_err(|err| link_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut link = listener
            .accept()
            .map_err(|err| link_error("accept failed", err))?;
        let peer = link
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        while running.load(Ordering::SeqCst) {
            let payload = match link.recv() {
                Ok(payload) => payload,
                Err(err) => match classify_recv_error(err) {
                    RecvErrorDisposition::Break => break,
                    RecvErrorDisposition::Idle | RecvErrorDisposition::Skip => continue,
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };

            print_received(&payload, &peer, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}
