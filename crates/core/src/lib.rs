pub mod datapoint;
pub mod error;
pub mod interval;
pub mod key;
pub mod location;
pub mod resolver;
pub mod task;

pub use datapoint::{DataPoint, Sample};
pub use error::*;
pub use interval::{Interval, TimeUnit};
pub use key::StorageKey;
pub use location::{
    Location, ObjectName, PlatformPath, PlatformResourceType, Protocol, Segment, SegmentValue, TreePath, WILDCARD,
};
pub use resolver::{LocationResolver, ObjectNameResolver, PlatformResolver, ProtocolResolver, TreePathResolver};
pub use task::{Avail, Kind, Task, TaskBuilder, TaskType};
