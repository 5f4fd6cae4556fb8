/// A response type used by module call methods.
#[derive(Default, Debug)]
pub struct CallResponse {}
