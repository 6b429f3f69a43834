//! WFS capabilities and GetFeature document fixtures for all supported
//! protocol versions, plus the XSD used to validate the fixture features.

pub const CAPS_URL: &str = "http://wfs.example.org/wfs?request=GetCapabilities";

/// WFS 1.0.0 capabilities: elements in the unversioned wfs namespace, the
/// GetFeature endpoint under Capability/Request, base URL ending in `?`.
pub const CAPS_1_0_0: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<WFS_Capabilities version="1.0.0" xmlns="http://www.opengis.net/wfs">
  <Capability>
    <Request>
      <GetFeature>
        <DCPType>
          <HTTP>
            <Get onlineResource="http://wfs.example.org/wfs?"/>
          </HTTP>
        </DCPType>
      </GetFeature>
    </Request>
  </Capability>
  <FeatureTypeList>
    <FeatureType><Name>aasg:Well</Name></FeatureType>
    <FeatureType><Name>aasg:Borehole</Name></FeatureType>
  </FeatureTypeList>
</WFS_Capabilities>"#;

/// WFS 1.1.0 capabilities: feature types still in the unversioned wfs
/// namespace, but the GetFeature endpoint moves to OperationsMetadata.
pub const CAPS_1_1_0: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="1.1.0"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:ows="http://www.opengis.net/ows"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:DCP><ows:HTTP><ows:Get xlink:href="http://wfs.example.org/caps"/></ows:HTTP></ows:DCP>
    </ows:Operation>
    <ows:Operation name="GetFeature">
      <ows:DCP><ows:HTTP><ows:Get xlink:href="http://wfs.example.org/wfs"/></ows:HTTP></ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType><wfs:Name>aasg:Well</wfs:Name></wfs:FeatureType>
    <wfs:FeatureType><wfs:Name>aasg:Borehole</wfs:Name></wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

/// WFS 2.0.0 capabilities: versioned wfs namespace, OWS 1.1, base URL that
/// already carries a query string.
pub const CAPS_2_0_0: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="2.0.0"
    xmlns:wfs="http://www.opengis.net/wfs/2.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:OperationsMetadata>
    <ows:Operation name="GetFeature">
      <ows:DCP><ows:HTTP><ows:Get xlink:href="http://wfs.example.org/wfs?map=aasg"/></ows:HTTP></ows:DCP>
    </ows:Operation>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType><wfs:Name>aasg:Well</wfs:Name></wfs:FeatureType>
    <wfs:FeatureType><wfs:Name>aasg:Borehole</wfs:Name></wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

/// Capabilities advertising a version this crate does not support.
pub const CAPS_UNSUPPORTED_VERSION: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<WFS_Capabilities version="0.9.0" xmlns="http://www.opengis.net/wfs">
  <FeatureTypeList>
    <FeatureType><Name>aasg:Well</Name></FeatureType>
  </FeatureTypeList>
</WFS_Capabilities>"#;

/// WFS 1.1.0 capabilities with no GetFeature operation described.
pub const CAPS_NO_GET_FEATURE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="1.1.0"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:ows="http://www.opengis.net/ows"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <wfs:FeatureTypeList>
    <wfs:FeatureType><wfs:Name>aasg:Well</wfs:Name></wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

/// Not well-formed XML.
pub const MALFORMED_XML: &[u8] = b"<WFS_Capabilities version=\"1.1.0\"><unclosed>";

/// GetFeature URL the 1.1.0 capabilities resolve to for `aasg:Well` with
/// `max_features = 5`.
pub const GET_FEATURE_URL_1_1_0: &str = "http://wfs.example.org/wfs?service=WFS&version=1.1.0&request=GetFeature&typename=aasg:Well&maxfeatures=5";

/// GetFeature response with five `aasg:Well` features; the second and fourth
/// carry depths that are not valid decimals.
pub const GET_FEATURE_DOC: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:gml="http://www.opengis.net/gml"
    xmlns:aasg="urn:example:well">
  <gml:featureMember>
    <aasg:Well><aasg:Depth>120.5</aasg:Depth></aasg:Well>
  </gml:featureMember>
  <gml:featureMember>
    <aasg:Well><aasg:Depth>rather deep</aasg:Depth></aasg:Well>
  </gml:featureMember>
  <gml:featureMember>
    <aasg:Well><aasg:Depth>88</aasg:Depth></aasg:Well>
  </gml:featureMember>
  <gml:featureMember>
    <aasg:Well><aasg:Depth>unknown</aasg:Depth></aasg:Well>
  </gml:featureMember>
  <gml:featureMember>
    <aasg:Well><aasg:Depth>300.25</aasg:Depth></aasg:Well>
  </gml:featureMember>
</wfs:FeatureCollection>"#;

/// Schema for the fixture features: a Well has exactly one decimal Depth.
pub const WELL_XSD: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:example:well"
           xmlns="urn:example:well"
           elementFormDefault="qualified">
  <xs:element name="Well">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Depth" type="xs:decimal"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="Borehole" type="xs:string"/>
</xs:schema>"#;
