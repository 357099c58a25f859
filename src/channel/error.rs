/// Error returned when operating on a broker channel.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    /// The underlying channel became unusable, e.g. because the connection
    /// dropped mid-operation.
    #[error("the broker channel is no longer usable")]
    Fault(#[source] anyhow::Error),
    /// The channel reference was disposed before the operation started.
    #[error("the channel reference has been disposed")]
    Disposed,
}
