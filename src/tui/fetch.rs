//! Background backend requests
//!
//! Each request runs as its own task and reports through the event
//! channel, tagged with the generation it was issued under. Whether the
//! result is still wanted is decided by the catalog when it arrives.

use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use super::event::Event;
use crate::data::{BackendClient, ListRequest, LoadRequest};

/// A request the app wants issued
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchRequest {
    List(ListRequest),
    Load(LoadRequest),
}

pub fn spawn_fetch(client: &BackendClient, request: FetchRequest, tx: UnboundedSender<Event>) {
    let client = client.clone();
    tokio::spawn(async move {
        let event = match request {
            FetchRequest::List(ListRequest { generation }) => Event::FilesListed {
                generation,
                result: client.list_files().await,
            },
            FetchRequest::Load(LoadRequest {
                generation,
                filename,
            }) => {
                let result = client.load_file(&filename).await;
                Event::ArrayLoaded {
                    generation,
                    filename,
                    result,
                }
            }
        };
        if tx.send(event).is_err() {
            debug!("Event loop gone; dropping fetch result");
        }
    });
}
