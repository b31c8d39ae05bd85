use fcp_sdk::builders::SchemaBuilder;
use fcp_sdk::can::Can;
use fcp_sdk::dynamic::DynamicSchema;
use fcp_sdk::result::Result;
use fcp_sdk::types::{Descriptor, StructDef};
use fcp_sdk::value::Value;
use fcp_sdk::MessageId;

fn main() -> Result<()> {
    let mut builder = SchemaBuilder::default();
    builder
        .add_struct(
            StructDef::new("BatteryState")
                .field("soc", Descriptor::unsigned(8))
                .field("health", Descriptor::unsigned(8)),
        )
        .bind_can_message("BatteryState", MessageId::try_from(10).expect("11-bit id"), "pwt");

    let mut blob = Vec::new();
    builder.commit(&mut blob)?;
    println!("schema blob: {} bytes", blob.len());

    let schema = DynamicSchema::from_bytes(&blob)?;
    let can = Can::new(Box::new(schema));

    let value = Value::record([("soc", Value::Unsigned(87)), ("health", Value::Unsigned(99))]);
    let frame = can.encode("BatteryState", &value)?;
    println!("frame: bus={} id={} dlc={} data={:02x?}", frame.bus, frame.sid, frame.dlc, frame.data);

    if let Some((name, decoded)) = can.decode(&frame)? {
        println!("decoded {}: {:?}", name, decoded);
    }
    Ok(())
}
