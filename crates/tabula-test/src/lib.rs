#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{
    MockActionConfig, MockDataset, MockFetchAction, MockMutationAction, MockRecord,
    RecordingNotifier, Subnet, actor, subnets,
};
